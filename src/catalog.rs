//! Indicator catalog and fixed dashboard parameters.
//!
//! Maps human-readable indicator names to World Bank catalog codes and
//! holds the default country list and selectable year ranges.

use std::fmt;
use std::str::FromStr;

/// Country code used when *requesting* the world aggregate.
pub const WORLD_REQUEST_CODE: &str = "WLD";

/// Country id the API *returns* for the world aggregate.
pub const WORLD_AGGREGATE_ID: &str = "1W";

/// Countries fetched by default: the world aggregate plus five nations.
pub const DEFAULT_COUNTRIES: [&str; 6] = [WORLD_REQUEST_CODE, "CHN", "IND", "USA", "IDN", "PAK"];

/// Year ranges offered by the range selector.
pub const YEAR_RANGES: [u32; 4] = [5, 10, 20, 100];

/// Demographic indicators known to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Indicator {
    TotalPopulation,
    PopulationDensity,
    PopulationGrowth,
    LifeExpectancy,
    BirthRate,
    DeathRate,
    FertilityRate,
}

impl Indicator {
    /// Every catalog entry, in display order.
    pub const ALL: [Indicator; 7] = [
        Indicator::TotalPopulation,
        Indicator::PopulationDensity,
        Indicator::PopulationGrowth,
        Indicator::LifeExpectancy,
        Indicator::BirthRate,
        Indicator::DeathRate,
        Indicator::FertilityRate,
    ];

    /// External API code.
    pub fn code(&self) -> &'static str {
        match self {
            Indicator::TotalPopulation => "SP.POP.TOTL",
            Indicator::PopulationDensity => "EN.POP.DNST",
            Indicator::PopulationGrowth => "SP.POP.GROW",
            Indicator::LifeExpectancy => "SP.DYN.LE00.IN",
            Indicator::BirthRate => "SP.DYN.CBRT.IN",
            Indicator::DeathRate => "SP.DYN.CDRT.IN",
            Indicator::FertilityRate => "SP.DYN.TFRT.IN",
        }
    }

    /// Catalog name, e.g. `TOTAL_POPULATION`.
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::TotalPopulation => "TOTAL_POPULATION",
            Indicator::PopulationDensity => "POPULATION_DENSITY",
            Indicator::PopulationGrowth => "POPULATION_GROWTH",
            Indicator::LifeExpectancy => "LIFE_EXPECTANCY",
            Indicator::BirthRate => "BIRTH_RATE",
            Indicator::DeathRate => "DEATH_RATE",
            Indicator::FertilityRate => "FERTILITY_RATE",
        }
    }

    /// Column / card label.
    pub fn label(&self) -> &'static str {
        match self {
            Indicator::TotalPopulation => "Total Population",
            Indicator::PopulationDensity => "Population Density",
            Indicator::PopulationGrowth => "Population Growth",
            Indicator::LifeExpectancy => "Life Expectancy",
            Indicator::BirthRate => "Birth Rate",
            Indicator::DeathRate => "Death Rate",
            Indicator::FertilityRate => "Fertility Rate",
        }
    }

    /// Look up a catalog entry by API code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|i| i.code().eq_ignore_ascii_case(code))
    }

    /// Default code list in catalog order.
    pub fn all_codes() -> Vec<String> {
        Self::ALL.iter().map(|i| i.code().to_string()).collect()
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Indicator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(indicator) = Self::from_code(s.trim()) {
            return Ok(indicator);
        }

        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        if let Some(indicator) = Self::ALL.into_iter().find(|i| i.name() == normalized) {
            return Ok(indicator);
        }

        // Short names used by the dashboard views.
        match normalized.as_str() {
            "POPULATION" => Ok(Indicator::TotalPopulation),
            "DENSITY" => Ok(Indicator::PopulationDensity),
            "GROWTH_RATE" | "GROWTH" => Ok(Indicator::PopulationGrowth),
            _ => Err(format!("Unknown indicator: {}", s)),
        }
    }
}

/// Human-readable label for any indicator code, falling back to the code.
pub fn label_for_code(code: &str) -> String {
    Indicator::from_code(code)
        .map(|i| i.label().to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Whether `years` is one of the selectable ranges.
pub fn is_valid_range(years: u32) -> bool {
    YEAR_RANGES.contains(&years)
}
