//! Loose scalar values and fail-closed decimal parsing.

// self
use crate::{_prelude::*, normalize::NormalizationError};

/// Scalar as it appears on the wire: the partner mixes strings, numbers, and booleans.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LooseScalar {
	/// JSON string.
	Text(String),
	/// JSON number, kept verbatim.
	Number(serde_json::Number),
	/// JSON boolean.
	Bool(bool),
}
impl LooseScalar {
	/// Textual rendering of the scalar.
	pub fn to_text(&self) -> String {
		match self {
			LooseScalar::Text(text) => text.clone(),
			LooseScalar::Number(number) => number.to_string(),
			LooseScalar::Bool(flag) => flag.to_string(),
		}
	}
}

/// Renders an optional scalar as text.
pub fn text(raw: Option<&LooseScalar>) -> Option<String> {
	raw.map(LooseScalar::to_text)
}

/// Parses an optional decimal field.
///
/// Absent or `null` yields `None`. Anything present must be an exact decimal literal: no
/// trimming, no locale separators, no exponent, and never a silent zero.
pub fn parse_decimal(
	field: &str,
	raw: Option<&LooseScalar>,
) -> Result<Option<Decimal>, NormalizationError> {
	let Some(raw) = raw else {
		return Ok(None);
	};
	let literal = match raw {
		LooseScalar::Text(text) => text.clone(),
		LooseScalar::Number(number) => number.to_string(),
		LooseScalar::Bool(flag) =>
			return Err(NormalizationError::NumericParse {
				field: field.to_owned(),
				raw_value: flag.to_string(),
			}),
	};

	Decimal::from_str_exact(&literal)
		.map(Some)
		.map_err(|_| NormalizationError::NumericParse { field: field.to_owned(), raw_value: literal })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn text_scalar(value: &str) -> LooseScalar {
		LooseScalar::Text(value.into())
	}

	#[test]
	fn decimal_keeps_scale_and_round_trips() {
		let parsed = parse_decimal("balance", Some(&text_scalar("4957.61")))
			.expect("Decimal should parse.")
			.expect("Decimal should be present.");

		assert_eq!(parsed.to_string(), "4957.61");
		assert_eq!(
			serde_json::to_value(parsed).expect("Decimal should serialize."),
			serde_json::json!("4957.61")
		);

		let scaled = parse_decimal("balance", Some(&text_scalar("100.00")))
			.expect("Decimal should parse.")
			.expect("Decimal should be present.");

		assert_eq!(scaled.to_string(), "100.00");
	}

	#[test]
	fn json_numbers_are_accepted() {
		let raw: LooseScalar = serde_json::from_str("12.5").expect("Number should deserialize.");

		assert_eq!(
			parse_decimal("amount", Some(&raw)).expect("Number should parse."),
			Some(Decimal::new(125, 1))
		);
	}

	#[test]
	fn malformed_literals_fail_closed() {
		for raw in ["", " ", "1.234,56", "12a", "NaN"] {
			let err = parse_decimal("balance", Some(&text_scalar(raw)))
				.expect_err("Malformed literal must not parse.");

			assert_eq!(
				err,
				NormalizationError::NumericParse { field: "balance".into(), raw_value: raw.into() }
			);
		}

		assert!(parse_decimal("balance", Some(&LooseScalar::Bool(true))).is_err());
	}

	#[test]
	fn absent_values_stay_absent() {
		assert_eq!(parse_decimal("balance", None).expect("Absent value should pass."), None);
	}
}
