use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::env;
use tracing::{info, warn};

use crate::constants;
use crate::services::batch_grid::ReceivePolicy;

/// Engine configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Timezone the business day is evaluated in (expiry/MFG date checks)
    pub business_timezone: Tz,
    /// Over/partial-receive policy applied to batch editors
    pub receive_policy: ReceivePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            business_timezone: constants::DEFAULT_BUSINESS_TIMEZONE
                .parse()
                .unwrap_or(chrono_tz::UTC),
            receive_policy: ReceivePolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults in `constants`
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let tz_name =
            env::var("MOVEMENT_TZ").unwrap_or_else(|_| constants::DEFAULT_BUSINESS_TIMEZONE.to_string());
        let business_timezone: Tz = tz_name
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid MOVEMENT_TZ value: {tz_name}"))?;

        let allow_over_receive = env::var("ALLOW_OVER_RECEIVE")
            .unwrap_or_else(|_| constants::DEFAULT_ALLOW_OVER_RECEIVE.to_string())
            .parse()
            .unwrap_or(constants::DEFAULT_ALLOW_OVER_RECEIVE);

        let allow_partial = env::var("ALLOW_PARTIAL_RECEIVE")
            .unwrap_or_else(|_| constants::DEFAULT_ALLOW_PARTIAL_RECEIVE.to_string())
            .parse()
            .unwrap_or(constants::DEFAULT_ALLOW_PARTIAL_RECEIVE);

        if allow_over_receive {
            warn!("Over-receive is enabled; totals above expected quantity will pass");
        }
        info!(
            "Engine configured - timezone: {business_timezone}, over-receive: {allow_over_receive}, partial: {allow_partial}"
        );

        Ok(Self {
            business_timezone,
            receive_policy: ReceivePolicy {
                allow_over_receive,
                allow_partial,
            },
        })
    }
}
