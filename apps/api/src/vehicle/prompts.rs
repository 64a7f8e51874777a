// Prompt templates for description generation.
// Placeholders are filled in one pass by `fill_template` before sending.

use crate::vehicle::models::{Condition, DescriptionMode, VehicleRecord};

/// Shown instead of a price when none was entered (or it was zero).
pub const NO_PRICE: &str = "Contact for price";
/// Stands in for any absent attribute in the full template.
pub const NOT_AVAILABLE: &str = "N/A";

/// Full listing prompt.
/// Replace: {year}, {make}, {model}, {miles}, {condition}, {price}, {engine},
///          {transmission}, {drivetrain}, {exterior_color}, {interior_color},
///          {interior_type}, {title_status}, {trim}, {details}
pub const FULL_DESCRIPTION_TEMPLATE: &str = r#"Create a compelling, detailed sales description for a {year} {make} {model} with {miles} miles in {condition} condition.

Specifications:
- Price: {price}
- Engine: {engine}
- Transmission: {transmission}
- Drivetrain: {drivetrain}
- Exterior Color: {exterior_color}
- Interior: {interior_color} {interior_type}
- Title Status: {title_status}
- Trim: {trim}

Additional details: {details}

Please create a professional, engaging, and detailed description that highlights the vehicle's features, condition, and specifications. Include the price and title status in the description."#;

/// Marketplace prompt. Same placeholders as the full template except {trim}.
pub const SHORT_DESCRIPTION_TEMPLATE: &str = r#"Create a concise, Facebook Marketplace-optimized description for a {year} {make} {model} ({miles} miles, {condition} condition).

Key specs: {engine} {transmission} {drivetrain}, {exterior_color} exterior, {interior_color} {interior_type} interior. {title_status} title. Price: {price}

Additional notes: {details}

Keep it brief but compelling, focusing on key selling points. Limit to 2-3 short paragraphs."#;

/// Renders the prompt for `mode`.
pub fn render_description_prompt(
    record: &VehicleRecord,
    miles: u32,
    condition: Condition,
    details: &str,
    mode: DescriptionMode,
) -> String {
    // The short template leaves gaps blank rather than printing N/A,
    // except title status which reads "Clean title" by default.
    let (template, missing, title_fallback) = match mode {
        DescriptionMode::Full => (FULL_DESCRIPTION_TEMPLATE, NOT_AVAILABLE, NOT_AVAILABLE),
        DescriptionMode::Short => (SHORT_DESCRIPTION_TEMPLATE, "", "Clean"),
    };

    let or_missing = |value: Option<&str>| value.unwrap_or(missing).to_string();

    fill_template(template, |name| {
        let value = match name {
            "year" => record.year.to_string(),
            "make" => record.make.clone(),
            "model" => record.model.clone(),
            "miles" => format_thousands(u64::from(miles)),
            "condition" => condition.as_str().to_string(),
            "price" => format_price(record.price),
            "engine" => or_missing(record.engine_size.as_deref()),
            "transmission" => or_missing(record.transmission.map(|t| t.as_str())),
            "drivetrain" => or_missing(record.drivetrain.map(|d| d.as_str())),
            "exterior_color" => or_missing(record.exterior_color.as_deref()),
            "interior_color" => or_missing(record.interior_color.as_deref()),
            "interior_type" => or_missing(record.interior_type.map(|t| t.as_str())),
            "title_status" => record
                .title_status
                .map(|t| t.as_str())
                .unwrap_or(title_fallback)
                .to_string(),
            "trim" => or_missing(record.trim.as_deref()),
            "details" => details.to_string(),
            _ => return None,
        };
        Some(value)
    })
}

/// Substitutes `{name}` placeholders in a single left-to-right pass. Substituted values
/// are never rescanned, and names `value_of` doesn't know are copied through as written.
fn fill_template(template: &str, value_of: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let filled = after
            .find('}')
            .and_then(|close| value_of(&after[..close]).map(|value| (close, value)));
        match filled {
            Some((close, value)) => {
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// US currency, e.g. `$12,500.00`. Absent or zero prices read "Contact for price".
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p.is_finite() && p > 0.0 => format_usd(p),
        _ => NO_PRICE.to_string(),
    }
}

pub fn format_usd(amount: f64) -> String {
    let cents = (amount * 100.0).round() as u64;
    format!("${}.{:02}", format_thousands(cents / 100), cents % 100)
}

/// Groups digits in threes: `45000` → `45,000`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::models::{Drivetrain, InteriorType, TitleStatus, Transmission};

    fn accord() -> VehicleRecord {
        VehicleRecord {
            year: 2003,
            make: "HONDA".to_string(),
            model: "Accord".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(45_000), "45,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(12_500.0)), "$12,500.00");
        assert_eq!(format_price(Some(999.5)), "$999.50");
        assert_eq!(format_price(None), "Contact for price");
        assert_eq!(format_price(Some(0.0)), "Contact for price");
    }

    #[test]
    fn test_full_prompt_absent_price_and_attributes() {
        let prompt = render_description_prompt(
            &accord(),
            45_000,
            Condition::Good,
            "One owner",
            DescriptionMode::Full,
        );
        assert!(prompt.contains("Contact for price"));
        assert!(prompt.contains("a 2003 HONDA Accord with 45,000 miles in Good condition"));
        assert!(prompt.contains("- Engine: N/A"));
        assert!(prompt.contains("- Trim: N/A"));
        assert!(prompt.contains("- Interior: N/A N/A"));
        assert!(prompt.contains("Additional details: One owner"));
        assert!(prompt.contains("professional"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_full_prompt_with_all_attributes() {
        let record = VehicleRecord {
            trim: Some("EX".to_string()),
            engine_size: Some("2.4".to_string()),
            transmission: Some(Transmission::Automatic),
            drivetrain: Some(Drivetrain::TwoWheel),
            exterior_color: Some("Silver".to_string()),
            interior_color: Some("Gray".to_string()),
            interior_type: Some(InteriorType::Leather),
            title_status: Some(TitleStatus::Clean),
            price: Some(4_500.0),
            ..accord()
        };
        let prompt =
            render_description_prompt(&record, 150_000, Condition::Fair, "", DescriptionMode::Full);
        assert!(prompt.contains("- Price: $4,500.00"));
        assert!(prompt.contains("- Drivetrain: 2WD"));
        assert!(prompt.contains("- Interior: Gray Leather"));
        assert!(prompt.contains("- Trim: EX"));
        assert!(!prompt.contains("N/A"));
    }

    #[test]
    fn test_short_prompt_defaults() {
        let prompt = render_description_prompt(
            &accord(),
            1_200,
            Condition::Excellent,
            "New tires",
            DescriptionMode::Short,
        );
        assert!(prompt.contains("Facebook Marketplace"));
        assert!(prompt.contains("(1,200 miles, Excellent condition)"));
        assert!(prompt.contains("Clean title. Price: Contact for price"));
        assert!(prompt.contains("2-3 short paragraphs"));
        assert!(!prompt.contains("N/A"));
        assert!(!prompt.contains("Trim"));
    }

    #[test]
    fn test_short_prompt_salvage_title() {
        let record = VehicleRecord {
            title_status: Some(TitleStatus::Salvage),
            ..accord()
        };
        let prompt =
            render_description_prompt(&record, 0, Condition::Poor, "", DescriptionMode::Short);
        assert!(prompt.contains("Salvage title."));
    }

    #[test]
    fn test_user_text_is_not_treated_as_placeholder() {
        let record = VehicleRecord {
            trim: Some("EX".to_string()),
            exterior_color: Some("{trim}".to_string()),
            ..accord()
        };
        let prompt = render_description_prompt(
            &record,
            500,
            Condition::Good,
            "Ask about {price} and {unknown}",
            DescriptionMode::Full,
        );
        assert!(prompt.contains("- Exterior Color: {trim}"));
        assert!(prompt.contains("- Trim: EX"));
        assert!(prompt.contains("Ask about {price} and {unknown}"));
    }

    #[test]
    fn test_fill_template_edges() {
        let value_of = |name: &str| (name == "a").then(|| "1".to_string());
        assert_eq!(fill_template("{a}{b}{a}", value_of), "1{b}1");
        assert_eq!(fill_template("{{a}} {", value_of), "{1} {");
        assert_eq!(fill_template("no braces", value_of), "no braces");
    }
}
