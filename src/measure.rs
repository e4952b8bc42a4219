// Parsing of the free text measurements that come with each drink ingredient, e.g. "2 cl",
// "1 1/2 oz" or "Juice of 1/2".
//
// Parsing happens in two stages: first an optional "Juice of " prefix is stripped, then the rest
// must be consumed in full by a quantity token optionally followed by a single space and a unit
// token. Anything left over is an error, we never truncate.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1},
    combinator::{all_consuming, opt, recognize, verify},
    error::{Error as NomError, ErrorKind},
    sequence::preceded,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use tracing::trace;

pub const JUICE_PREFIX: &str = "Juice of ";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MeasureError {
    #[error("can't parse measurement {raw:?}")]
    UnparseableMeasurement { raw: String },
}

impl MeasureError {
    fn unparseable(raw: &str) -> Self {
        Self::UnparseableMeasurement { raw: raw.into() }
    }
}

/// Known measurement units. Only lower case spellings are recognized, so "2 OZ" is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Oz,
    Part,
    Ml,
    Cl,
    Shot,
    Tsp,
    Tbsp,
    Cup,
    Pinch,
    Splash,
    Dash,
    Scoop,
    Drop,
}

struct Spelling {
    unit: Unit,
    stems: &'static [&'static str],
    plural: &'static str,
}

// One row per unit. A new unit only needs a variant above and a row here.
#[rustfmt::skip]
static VOCABULARY: &[Spelling] = &[
    Spelling { unit: Unit::Oz, stems: &["oz"], plural: "s" },
    Spelling { unit: Unit::Part, stems: &["part"], plural: "s" },
    Spelling { unit: Unit::Ml, stems: &["ml"], plural: "s" },
    Spelling { unit: Unit::Cl, stems: &["cl"], plural: "s" },
    Spelling { unit: Unit::Shot, stems: &["shot"], plural: "s" },
    Spelling { unit: Unit::Tsp, stems: &["tsp"], plural: "s" },
    Spelling { unit: Unit::Tbsp, stems: &["tbsp", "tblsp"], plural: "s" },
    Spelling { unit: Unit::Cup, stems: &["cup"], plural: "s" },
    Spelling { unit: Unit::Pinch, stems: &["pinch"], plural: "es" },
    Spelling { unit: Unit::Splash, stems: &["splash"], plural: "es" },
    Spelling { unit: Unit::Dash, stems: &["dash"], plural: "es" },
    Spelling { unit: Unit::Scoop, stems: &["scoop"], plural: "s" },
    Spelling { unit: Unit::Drop, stems: &["drop"], plural: "s" },
];

impl Unit {
    pub fn all() -> impl Iterator<Item = Unit> {
        VOCABULARY.iter().map(|s| s.unit)
    }

    /// All accepted spellings of this unit, singular and plural
    pub fn spellings(self) -> Vec<String> {
        VOCABULARY
            .iter()
            .filter(|s| s.unit == self)
            .flat_map(|s| {
                s.stems
                    .iter()
                    .flat_map(|stem| [stem.to_string(), format!("{}{}", stem, s.plural)])
            })
            .collect()
    }

    /// Look up the unit for an exact spelling, e.g. "dashes" -> Dash
    pub fn from_spelling(s: &str) -> Option<Self> {
        match unit_token(s) {
            Ok(("", (unit, _))) => Some(unit),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuantity {
    /// Quantity as written, e.g. "1 1/2". Never evaluated as a number.
    pub quantity: String,
    /// Unit as written, e.g. "cups"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ParsedQuantity {
    pub fn unit_kind(&self) -> Option<Unit> {
        self.unit.as_deref().and_then(Unit::from_spelling)
    }
}

impl Display for ParsedQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.unit {
            Some(u) => write!(f, "{} {}", self.quantity, u),
            None => write!(f, "{}", self.quantity),
        }
    }
}

impl FromStr for ParsedQuantity {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_present(s)
    }
}

/// Parse an optional measurement string.
///
/// A missing measurement is not an error and gives `Ok(None)`. A present one must match the
/// quantity/unit grammar in full after trimming and stripping an optional "Juice of " prefix,
/// otherwise `MeasureError::UnparseableMeasurement` is returned with the raw input.
pub fn parse_measure(raw: Option<&str>) -> Result<Option<ParsedQuantity>, MeasureError> {
    raw.map(parse_present).transpose()
}

fn parse_present(raw: &str) -> Result<ParsedQuantity, MeasureError> {
    let body = strip_juice_prefix(raw.trim());
    let (_, (quantity, unit)) =
        all_consuming((quantity_token, opt(preceded(char(' '), unit_token))))
            .parse(body)
            .map_err(|_| MeasureError::unparseable(raw))?;

    // the grammar requires a digit, but an empty quantity must never slip through as a success
    if quantity.is_empty() {
        return Err(MeasureError::unparseable(raw));
    }

    let parsed = ParsedQuantity {
        quantity: quantity.into(),
        unit: unit.map(|(_, spelled)| spelled.into()),
    };
    trace!(raw, %parsed, "Parsed measurement");
    Ok(parsed)
}

/// First stage: drop the optional, case sensitive "Juice of " prefix
pub fn strip_juice_prefix(s: &str) -> &str {
    s.strip_prefix(JUICE_PREFIX).unwrap_or(s)
}

/// A decimal with digits on both sides of a single point ("0.5"), or a run of digits and '/'
/// that ends in a digit ("3", "1/2")
fn number(input: &str) -> IResult<&str, &str> {
    let decimal = recognize((digit1, char('.'), digit1));
    let fraction = verify(
        take_while1(|c: char| c.is_ascii_digit() || c == '/'),
        |s: &str| s.ends_with(|c: char| c.is_ascii_digit()),
    );
    alt((decimal, fraction)).parse(input)
}

/// Quantity token: a number, optionally followed by a space and a second number ("1 1/2")
pub fn quantity_token(input: &str) -> IResult<&str, &str> {
    recognize((number, opt(preceded(char(' '), number)))).parse(input)
}

/// Unit token: any spelling from the vocabulary. The longest matching spelling wins.
pub fn unit_token(input: &str) -> IResult<&str, (Unit, &str)> {
    let mut best: Option<(Unit, &str, &str)> = None;
    for s in VOCABULARY {
        for stem in s.stems {
            let res: IResult<&str, &str> = recognize((tag(*stem), opt(tag(s.plural)))).parse(input);
            if let Ok((rest, spelled)) = res {
                if best.is_none_or(|(_, _, b)| spelled.len() > b.len()) {
                    best = Some((s.unit, rest, spelled));
                }
            }
        }
    }
    match best {
        Some((unit, rest, spelled)) => Ok((rest, (unit, spelled))),
        None => Err(nom::Err::Error(NomError::new(input, ErrorKind::Tag))),
    }
}
