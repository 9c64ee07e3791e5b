use secrecy::ExposeSecret;
use serde::Serialize;
use voicecart_core::config::{AppConfig, LoadOptions};
use voicecart_fulfillment::{intents, FulfillmentService};

const SANDBOX_PREFIX: &str = "sandbox_";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_payment_credentials(&config));
            checks.push(check_intent_registration(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("payment_credentials"));
            checks.push(skipped("intent_registration"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn check_payment_credentials(config: &AppConfig) -> DoctorCheck {
    let payments = &config.payments;
    let sandbox = [
        payments.client_key.expose_secret(),
        payments.authorization_fingerprint.expose_secret(),
    ]
    .iter()
    .any(|secret| secret.starts_with(SANDBOX_PREFIX));
    let mode = if sandbox { "sandbox" } else { "production" };

    DoctorCheck {
        name: "payment_credentials",
        status: CheckStatus::Pass,
        details: format!(
            "{} gateway in {mode} mode for merchant `{}`",
            payments.gateway, payments.merchant_id
        ),
    }
}

fn check_intent_registration(config: &AppConfig) -> DoctorCheck {
    match FulfillmentService::from_config(config) {
        Ok(service) => {
            let registered = service.intents();
            let missing: Vec<&str> = intents::ALL
                .iter()
                .copied()
                .filter(|intent| !registered.contains(intent))
                .collect();
            if missing.is_empty() {
                DoctorCheck {
                    name: "intent_registration",
                    status: CheckStatus::Pass,
                    details: format!("{} intent handlers registered", service.handler_count()),
                }
            } else {
                DoctorCheck {
                    name: "intent_registration",
                    status: CheckStatus::Fail,
                    details: format!("missing handlers: {}", missing.join(", ")),
                }
            }
        }
        Err(error) => DoctorCheck {
            name: "intent_registration",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
