use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Mortgage
// ---------------------------------------------------------------------------

#[napi]
pub fn mortgage_insurance_premium(input_json: String) -> NapiResult<String> {
    let input: canfin_core::mortgage::insurance::InsurancePremiumInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = canfin_core::mortgage::insurance::mortgage_insurance_premium(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn mortgage_payments(input_json: String) -> NapiResult<String> {
    let input: canfin_core::mortgage::schedule::MortgagePaymentsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        canfin_core::mortgage::schedule::mortgage_payments(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn mortgage_max_amount(input_json: String) -> NapiResult<String> {
    let input: canfin_core::mortgage::affordability::AffordabilityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        canfin_core::mortgage::affordability::mortgage_max_amount(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Inflation
// ---------------------------------------------------------------------------

#[napi]
pub fn adjust_for_inflation(input_json: String) -> NapiResult<String> {
    let input: canfin_core::inflation::InflationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = canfin_core::inflation::adjust_for_inflation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
