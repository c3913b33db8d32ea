//! Static tax settings by jurisdiction
//!
//! Angola (AGT) is the only table; every context falls back to it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaxSettings {
    pub name: &'static str,
    pub currency: &'static str,
    /// Tax name -> rate in percent
    pub taxes: &'static [(&'static str, f64)],
    /// Asset class -> yearly depreciation rate in percent
    pub depreciation_rates: &'static [(&'static str, f64)],
    /// Asset class -> depreciation period in whole years
    pub depreciation_years: &'static [(&'static str, u32)],
}

impl TaxSettings {
    pub fn tax_rate(&self, name: &str) -> Option<f64> {
        lookup(self.taxes, name)
    }

    pub fn depreciation_rate(&self, asset_class: &str) -> Option<f64> {
        lookup(self.depreciation_rates, asset_class)
    }

    pub fn depreciation_period(&self, asset_class: &str) -> Option<u32> {
        lookup(self.depreciation_years, asset_class)
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

pub static ANGOLA: TaxSettings = TaxSettings {
    name: "Angola",
    currency: "AOA",
    taxes: &[
        ("iva", 14.0),
        ("imposto_industrial", 25.0),
        ("imposto_industrial_agricola", 10.0),
        ("inss_patronal", 8.0),
        ("inss_trabalhador", 3.0),
        ("amortizacao_imaterial", 25.0),
    ],
    depreciation_rates: &[
        ("edificios_escritorios", 4.0),
        ("edificios_industriais", 4.0),
        ("obras_publicas", 4.0),
        ("mobiliario", 10.0),
        ("equipamento_informatico", 25.0),
        ("software", 33.33),
        ("equipamento_transporte_ligeiro", 25.0),
        ("equipamento_transporte_pesado", 20.0),
        ("maquinaria_industrial", 12.5),
        ("ferramentas", 25.0),
        ("equipamento_basico", 10.0),
    ],
    depreciation_years: &[
        ("edificios", 25),
        ("viaturas", 4),
        ("informatica", 4),
        ("mobiliario", 10),
        ("maquinaria", 8),
        ("ferramentas", 4),
        ("software", 3),
    ],
};

/// Tax settings for a jurisdiction (case-insensitive)
pub fn tax_settings(context: &str) -> &'static TaxSettings {
    if !context.eq_ignore_ascii_case("angola") {
        log::debug!("No tax settings for '{}', using Angola", context);
    }
    &ANGOLA
}
