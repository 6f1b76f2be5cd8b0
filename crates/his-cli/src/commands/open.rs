use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use his_auth::{
    AuthConfig, CacheStats, DenyReason, GateState, HttpSessionValidator, RouteGate, SessionGuard,
};
use his_notifications::ToastCenter;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::commands::auth::session_store;
use crate::config::ConfigStore;
use crate::output::{mark, print_json, print_table};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationReport {
    pub path: String,
    pub authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

/// How the session checks behind a run of navigations were answered.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSummary {
    pub cached: u64,
    pub remote: u64,
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheSummary {
    fn from(stats: CacheStats) -> Self {
        Self {
            cached: stats.hits,
            remote: stats.misses,
            hit_rate: stats.hit_rate(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OpenReport {
    pub navigations: Vec<NavigationReport>,
    pub cache: CacheSummary,
}

pub async fn open(
    store: &ConfigStore,
    profile: &str,
    server: &str,
    auth: &AuthConfig,
    paths: &[String],
    format: OutputFormat,
) -> Result<()> {
    let session = Arc::new(session_store(store, profile));
    let validator = HttpSessionValidator::new(server, &auth.remote)
        .context("Failed to set up session validation")?;
    let toasts = Arc::new(ToastCenter::with_lifetime(None));
    let guard = Arc::new(SessionGuard::new(
        session,
        Arc::new(validator),
        toasts.clone(),
        &auth.guard,
    ));

    let reports = visit(&RouteGate::new(guard.clone()), &toasts, paths).await;
    let denied = reports.iter().filter(|r| !r.authorized).count();
    let cache = CacheSummary::from(guard.cache_stats());

    match format {
        OutputFormat::Json => print_json(&OpenReport {
            navigations: reports,
            cache,
        })?,
        OutputFormat::Table => {
            print_table(
                ["", "Path", "Result", "Redirect", "Notice"],
                reports
                    .iter()
                    .map(|r| {
                        [
                            mark(r.authorized),
                            r.path.clone(),
                            r.reason.clone().unwrap_or_else(|| "authorized".into()),
                            r.redirect.clone().unwrap_or_default(),
                            r.notices.join("; "),
                        ]
                    })
                    .collect(),
            );
            println!(
                "{} {} cached, {} remote ({:.0}% hit rate)",
                "Session checks:".dimmed(),
                cache.cached,
                cache.remote,
                cache.hit_rate
            );
        }
    }

    if denied > 0 {
        anyhow::bail!("{denied} of {} paths denied", paths.len());
    }
    Ok(())
}

/// Navigates to each path in turn, waiting for the gate to settle.
pub async fn visit(gate: &RouteGate, toasts: &ToastCenter, paths: &[String]) -> Vec<NavigationReport> {
    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        let mut state = gate.navigate(path);
        if !state.is_settled() {
            state = gate.settled().await;
        }
        let notices = toasts.drain().into_iter().map(|t| t.message).collect();
        reports.push(report(path, state, notices));
    }
    reports
}

fn report(path: &str, state: GateState, notices: Vec<String>) -> NavigationReport {
    let (authorized, reason, redirect) = match state {
        GateState::Denied(denial) => (
            false,
            Some(describe(denial.reason)),
            Some(denial.redirect.to_uri()),
        ),
        GateState::Authorized => (true, None, None),
        GateState::Pending => (false, Some("still pending".into()), None),
    };
    NavigationReport {
        path: path.to_string(),
        authorized,
        reason,
        redirect,
        notices,
    }
}

fn describe(reason: DenyReason) -> String {
    match reason {
        DenyReason::MissingToken => "not signed in".into(),
        DenyReason::InvalidSession => "session invalid".into(),
        DenyReason::Forbidden { required } => format!("requires role {required}"),
    }
}
