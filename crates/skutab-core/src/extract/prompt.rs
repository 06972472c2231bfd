//! Prompt construction for extraction calls.

use std::fmt;
use std::str::FromStr;

/// Appended after every unit so the oracle answers in the parseable line format.
pub const OUTPUT_FORMAT_INSTRUCTIONS: &str = "Return only the attribute-value lines, nothing else.";

/// Industries with a dedicated focus sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Industry {
    Automotive,
    Pharmaceuticals,
    Electronics,
    FoodBeverages,
    Chemical,
    /// Anything else; the name is kept for the prompt.
    Other(String),
}

impl Industry {
    fn focus(&self) -> &'static str {
        match self {
            Industry::Automotive => "Focus on vehicle specifications, engine type, mileage, model, fuel type, transmission, and part numbers.",
            Industry::Pharmaceuticals => "Focus on active ingredients, brand name, dosage form, strength, expiry date, and packaging.",
            Industry::Electronics => "Focus on model, power, capacity, voltage, wattage, and product specifications.",
            Industry::FoodBeverages => "Focus on nutritional values, ingredients, flavor, weight, and packaging details.",
            Industry::Chemical => "Focus on chemical name, purity, CAS number, molecular weight, and application area.",
            Industry::Other(_) => "Extract all relevant technical and descriptive attributes clearly.",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Industry::Automotive => "automotive",
            Industry::Pharmaceuticals => "pharmaceuticals",
            Industry::Electronics => "electronics",
            Industry::FoodBeverages => "food_beverages",
            Industry::Chemical => "chemical",
            Industry::Other(name) => name,
        }
    }
}

impl Default for Industry {
    fn default() -> Self {
        Industry::Other("general".to_string())
    }
}

impl FromStr for Industry {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "automotive" => Industry::Automotive,
            "pharmaceuticals" => Industry::Pharmaceuticals,
            "electronics" => Industry::Electronics,
            "food_beverages" => Industry::FoodBeverages,
            "chemical" => Industry::Chemical,
            "" => Industry::default(),
            _ => Industry::Other(s.trim().to_string()),
        })
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Instruction prefix shared by every unit of one extraction.
pub fn domain_prompt(industry: &Industry, product_type: Option<&str>) -> String {
    let mut prompt = format!(
        "Given a single SKU description, extract *all possible* attributes and their values \
         using the format: Attribute = Value relevant to the {} industry",
        industry
    );
    match product_type.map(str::trim).filter(|p| !p.is_empty()) {
        Some(product_type) => prompt.push_str(&format!(" for {}.", product_type)),
        None => prompt.push('.'),
    }
    prompt.push(' ');
    prompt.push_str(industry.focus());
    prompt
}

/// Full prompt for one unit: domain prefix, the unit text, then format instructions.
pub fn unit_prompt(domain_prompt: &str, unit: &str) -> String {
    format!(
        "{}\n\nSKU Description:\n{}\n\n{}",
        domain_prompt, unit, OUTPUT_FORMAT_INSTRUCTIONS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_industry_gets_focus() {
        let industry: Industry = "Electronics".parse().unwrap();
        assert_eq!(industry, Industry::Electronics);

        let prompt = domain_prompt(&industry, Some("laptops"));
        assert!(prompt.contains("relevant to the electronics industry for laptops."));
        assert!(prompt.ends_with("voltage, wattage, and product specifications."));
    }

    #[test]
    fn test_unknown_industry_is_generic() {
        let industry: Industry = "Textiles".parse().unwrap();
        assert_eq!(industry, Industry::Other("Textiles".to_string()));

        let prompt = domain_prompt(&industry, Some("  "));
        assert!(prompt.contains("relevant to the Textiles industry."));
        assert!(prompt.ends_with("Extract all relevant technical and descriptive attributes clearly."));
    }

    #[test]
    fn test_unit_prompt_layout() {
        let prompt = unit_prompt("PREFIX", "Widget A, 4GB RAM");
        assert!(prompt.starts_with("PREFIX"));
        assert!(prompt.contains("Widget A, 4GB RAM"));
        assert!(prompt.ends_with(OUTPUT_FORMAT_INSTRUCTIONS));
    }
}
