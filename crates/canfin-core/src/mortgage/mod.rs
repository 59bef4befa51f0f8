//! Canadian mortgage calculations: rate conversion, default-insurance
//! premiums, amortization schedules and affordability estimation.

pub mod affordability;
pub mod insurance;
pub mod rates;
pub mod schedule;

pub use affordability::{
    mortgage_max_amount, AffordabilityInput, AffordabilityLimit, AffordabilityOptions,
    AffordabilityOutput,
};
pub use insurance::{
    mortgage_insurance_premium, premium_amount, InsurancePremiumInput, InsurancePremiumOutput,
};
pub use rates::{effective_annual_rate, periodic_rate, RateSpec};
pub use schedule::{
    mortgage_payments, mortgage_payments_observed, AmortizationObserver, AmortizationRow,
    MortgagePaymentsInput, PaymentFrequency, PeriodDiagnostics, ScheduleOptions,
};
