//! Product catalog enums.

use serde::{Deserialize, Serialize};

/// Product category (closed set).
///
/// The catalog is partitioned into these fixed departments; category pages
/// and the unique `(name, category)` constraint both key on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Face,
    Eyes,
    Lips,
    Nails,
    BrushesAndTools,
    MakeupRemovals,
    SkinCare,
    HairCare,
    BathAndBody,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 9] = [
        Self::Face,
        Self::Eyes,
        Self::Lips,
        Self::Nails,
        Self::BrushesAndTools,
        Self::MakeupRemovals,
        Self::SkinCare,
        Self::HairCare,
        Self::BathAndBody,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Face => "face",
            Self::Eyes => "eyes",
            Self::Lips => "lips",
            Self::Nails => "nails",
            Self::BrushesAndTools => "brushes_and_tools",
            Self::MakeupRemovals => "makeup_removals",
            Self::SkinCare => "skin_care",
            Self::HairCare => "hair_care",
            Self::BathAndBody => "bath_and_body",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "face" => Ok(Self::Face),
            "eyes" => Ok(Self::Eyes),
            "lips" => Ok(Self::Lips),
            "nails" => Ok(Self::Nails),
            "brushes_and_tools" => Ok(Self::BrushesAndTools),
            "makeup_removals" => Ok(Self::MakeupRemovals),
            "skin_care" => Ok(Self::SkinCare),
            "hair_care" => Ok(Self::HairCare),
            "bath_and_body" => Ok(Self::BathAndBody),
            _ => Err(format!("invalid product category: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_from_str_round_trip() {
        for category in Category::ALL {
            let parsed: Category = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Category::SkinCare).unwrap();
        assert_eq!(json, "\"skin_care\"");
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!("perfume".parse::<Category>().is_err());
    }
}
