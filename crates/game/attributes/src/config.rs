/// Tunable behavior of an [`AttributeSystem`](crate::AttributeSystem).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeConfig {
    /// How several multiplicative contributions to one attribute combine.
    #[cfg_attr(feature = "serde", serde(default))]
    pub multiplier_policy: MultiplierPolicy,
}

impl AttributeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_multiplier_policy(mut self, multiplier_policy: MultiplierPolicy) -> Self {
        self.multiplier_policy = multiplier_policy;
        self
    }
}

/// Combination rule for multiplicative contributions.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MultiplierPolicy {
    /// Multiply every multiplicative contribution together.
    #[default]
    Product,
    /// Apply only the most recently added multiplicative contribution.
    LatestOnly,
}
