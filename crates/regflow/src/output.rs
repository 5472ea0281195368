//! Report rendering for the terminal

use regflow_core::{DomainState, Observed, PlanStatus, Report};
use std::fmt::Write;

/// Render `report` for humans
pub fn render(report: &Report) -> String {
    let mut out = String::new();
    // Writing to a String never fails
    let _ = write_report(&mut out, report);
    out
}

/// Render `report` as pretty JSON
pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

fn write_report(out: &mut String, report: &Report) -> std::fmt::Result {
    write!(out, "Domain: {} ({}", report.domain(), report.mode())?;
    if report.dry_run() {
        write!(out, ", dry run")?;
    }
    writeln!(out, ")")?;

    write_state(out, report.initial_state())?;
    write_failures(out, "Probe failures", report.probe_failures())?;

    if let Some(status) = report.plan_status() {
        match status {
            PlanStatus::Ready if report.entries().is_empty() => {
                writeln!(out, "\nPlan: nothing to do")?
            }
            PlanStatus::Ready => writeln!(out, "\nPlan: {} action(s)", report.entries().len())?,
            PlanStatus::Incomplete(reason) => writeln!(out, "\nPlan: incomplete ({})", reason)?,
            PlanStatus::Blocked(reason) => writeln!(out, "\nPlan: blocked ({})", reason)?,
        }

        for (i, entry) in report.entries().iter().enumerate() {
            writeln!(out, "  {}. {}: {}", i + 1, entry.action, entry.outcome)?;
        }
    }

    if let Some(halt) = report.halt() {
        writeln!(out, "\n{}", halt)?;
    }

    if let Some(final_state) = report.final_state() {
        writeln!(out, "\nAfter setup:")?;
        write_state(out, final_state)?;
        write_failures(out, "Closing probe failures", report.final_probe_failures())?;
    }

    writeln!(
        out,
        "\nResult: {}",
        if report.is_success() { "success" } else { "failed" }
    )
}

fn write_state(out: &mut String, state: &DomainState) -> std::fmt::Result {
    writeln!(out, "  Registered:            {}", yes_no(&state.is_registered))?;

    let zone = match &state.zone {
        Observed::Known(Some(zone)) => format!("{} ({})", zone.id, zone.status),
        Observed::Known(None) => "none".to_string(),
        Observed::Unknown => "unknown".to_string(),
    };
    writeln!(out, "  Zone:                  {}", zone)?;
    writeln!(out, "  Registrar nameservers: {}", hosts(&state.registrar_nameservers))?;
    writeln!(out, "  Edge nameservers:      {}", hosts(&state.edge_nameservers))?;
    writeln!(
        out,
        "  Nameservers in sync:   {}",
        if state.nameservers_in_sync() { "yes" } else { "no" }
    )?;

    let records = match &state.baseline_records_present {
        Observed::Known(present) if present.is_empty() => "none".to_string(),
        Observed::Known(present) => present
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Observed::Unknown => "unknown".to_string(),
    };
    writeln!(out, "  Baseline records:      {}", records)?;

    let worker = match &state.worker_subdomain_configured {
        None => "not checked",
        Some(Observed::Known(true)) => "configured",
        Some(Observed::Known(false)) => "missing",
        Some(Observed::Unknown) => "unknown",
    };
    writeln!(out, "  Worker subdomain:      {}", worker)?;

    if let Some(quote) = &state.registration_quote {
        let line = match quote {
            Observed::Known(q) if !q.available => "not available".to_string(),
            Observed::Known(q) => {
                let currency = q.currency.as_deref().unwrap_or("");
                let mut line = match q.price {
                    Some(price) => format!("available at {:.2} {}", price, currency),
                    None => "available (price unknown)".to_string(),
                };
                if let Some(balance) = q.balance {
                    let _ = write!(line, ", balance {:.2} {}", balance, currency);
                }
                if q.premium {
                    line.push_str(", premium");
                }
                line
            }
            Observed::Unknown => "unknown".to_string(),
        };
        writeln!(out, "  Registration:          {}", line)?;
    }

    Ok(())
}

fn write_failures(
    out: &mut String,
    title: &str,
    failures: &[regflow_core::ProviderFailure],
) -> std::fmt::Result {
    if failures.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}:", title)?;
    for failure in failures {
        writeln!(out, "  - {}", failure)?;
    }
    Ok(())
}

fn yes_no(value: &Observed<bool>) -> &'static str {
    match value {
        Observed::Known(true) => "yes",
        Observed::Known(false) => "no",
        Observed::Unknown => "unknown",
    }
}

fn hosts(value: &Observed<Vec<String>>) -> String {
    match value {
        Observed::Known(hosts) if hosts.is_empty() => "none".to_string(),
        Observed::Known(hosts) => hosts.join(", "),
        Observed::Unknown => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regflow_core::{BaselineRecord, DomainName, ZoneInfo};

    fn state() -> DomainState {
        let mut state = DomainState::new(DomainName::parse("example.com").unwrap());
        state.is_registered = Observed::Known(true);
        state.zone = Observed::Known(Some(ZoneInfo {
            id: "zone-1".to_string(),
            status: "pending".to_string(),
        }));
        state.registrar_nameservers = Observed::Unknown;
        state.edge_nameservers = Observed::Known(vec!["ada.ns.cloudflare.com".to_string()]);
        state.baseline_records_present = Observed::Known([BaselineRecord::Apex].into());
        state
    }

    #[test]
    fn test_state_lines() {
        let mut out = String::new();
        write_state(&mut out, &state()).unwrap();

        assert!(out.contains("Registered:            yes"));
        assert!(out.contains("zone-1 (pending)"));
        assert!(out.contains("Registrar nameservers: unknown"));
        assert!(out.contains("Nameservers in sync:   no"));
        assert!(out.contains("Baseline records:      apex A"));
        assert!(out.contains("Worker subdomain:      not checked"));
        assert!(!out.contains("Registration:"));
    }
}
