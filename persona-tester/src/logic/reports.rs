use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use persona_core::{DesignAudit, DesignRow};

use super::{RunReport, SweepSummary};

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    report: &RunReport,
    total_duration: Duration,
) -> Result<()> {
    let assignment = &report.assignment;
    writeln!(out)?;
    writeln!(out, "{}", "📊 Persona Assignment".bright_cyan().bold())?;
    writeln!(out, "{}", "=====================".cyan())?;
    writeln!(out, "Preference key: {}", assignment.key)?;
    writeln!(out, "Hash: {}", assignment.hash)?;
    writeln!(
        out,
        "Assigned block: {}",
        assignment.block_id.to_string().green().bold()
    )?;

    if assignment.is_empty() {
        writeln!(
            out,
            "{}",
            "⚠️  Design table has no rows for this block".yellow()
        )?;
    } else {
        for set in assignment.choice_sets() {
            writeln!(out)?;
            writeln!(out, "   Set {}", set.set.to_string().bold())?;
            for row in &set.alternatives {
                writeln!(out, "     {}", describe_row(row))?;
            }
        }
    }

    if let Some(audit) = &report.audit {
        write_console_audit(out, audit)?;
    }
    if let Some(sweep) = &report.sweep {
        write_console_sweep(out, sweep)?;
    }

    writeln!(out)?;
    writeln!(out, "Total time: {total_duration:?}")?;
    Ok(())
}

fn write_console_audit<W: Write + ?Sized>(out: &mut W, audit: &DesignAudit) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "🔎 Design Table Audit".bright_yellow().bold())?;
    writeln!(out, "{}", "=====================".yellow())?;
    writeln!(out, "Rows: {}", audit.row_count)?;
    let status = if audit.is_valid() {
        "✅ VALID".green()
    } else {
        "❌ INVALID".red()
    };
    writeln!(out, "Structure: {status}")?;
    if !audit.missing_blocks.is_empty() {
        let missing: Vec<String> = audit.missing_blocks.iter().map(ToString::to_string).collect();
        writeln!(out, "Missing blocks: {}", missing.join(", ").yellow())?;
    }
    for issue in &audit.issues {
        writeln!(out, "     • {}", issue.to_string().red())?;
    }
    Ok(())
}

fn write_console_sweep<W: Write + ?Sized>(out: &mut W, sweep: &SweepSummary) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "⚡ Block Distribution".bright_yellow().bold())?;
    writeln!(out, "{}", "====================".yellow())?;
    writeln!(out, "Preference combinations: {}", sweep.total)?;
    for share in &sweep.blocks {
        writeln!(
            out,
            "   Block {}: {:>6} ({:>5.1}%), empty {}",
            share.block_id, share.assignments, share.share_pct, share.empty_assignments
        )?;
    }
    if sweep.all_blocks_reachable() {
        writeln!(out, "{}", "All blocks reachable".green())?;
    } else {
        let unreachable: Vec<String> = sweep.unreachable.iter().map(ToString::to_string).collect();
        writeln!(out, "Unreachable blocks: {}", unreachable.join(", ").red())?;
    }
    Ok(())
}

fn describe_row(row: &DesignRow) -> String {
    format!(
        "Alt {}: cost {} walk {}m co2 saved {} reliability {}% resched {} noise {} mode {}",
        row.alt,
        row.cost,
        row.walk,
        row.co2_save,
        row.reliability,
        row.resched,
        row.noise,
        row.mode_flag
    )
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, report: &RunReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(out: &mut W, report: &RunReport) -> Result<()> {
    let assignment = &report.assignment;
    writeln!(out, "# Persona Assignment\n")?;
    writeln!(out, "- **Preference key**: `{}`", assignment.key)?;
    writeln!(out, "- **Hash**: {}", assignment.hash)?;
    writeln!(out, "- **Assigned block**: {}", assignment.block_id)?;
    writeln!(out, "- **Rows**: {}\n", assignment.len())?;

    if !assignment.is_empty() {
        writeln!(
            out,
            "| Set | Alt | Cost | Walk | CO2save | Reliability | Resched | Noise | ModeFlag |"
        )?;
        writeln!(out, "|---|---|---|---|---|---|---|---|---|")?;
        for row in &assignment.rows {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                row.set,
                row.alt,
                row.cost,
                row.walk,
                row.co2_save,
                row.reliability,
                row.resched,
                row.noise,
                row.mode_flag
            )?;
        }
        writeln!(out)?;
    }

    if let Some(audit) = &report.audit {
        writeln!(out, "## Design Table Audit\n")?;
        writeln!(out, "- **Rows**: {}", audit.row_count)?;
        writeln!(out, "- **Valid**: {}", if audit.is_valid() { "✅" } else { "❌" })?;
        writeln!(out, "- **Complete**: {}", if audit.is_complete() { "✅" } else { "❌" })?;
        for issue in &audit.issues {
            writeln!(out, "- {issue}")?;
        }
        writeln!(out)?;
    }

    if let Some(sweep) = &report.sweep {
        writeln!(out, "## Block Distribution\n")?;
        writeln!(out, "| Block | Assignments | Share | Empty |")?;
        writeln!(out, "|---|---|---|---|")?;
        for share in &sweep.blocks {
            writeln!(
                out,
                "| {} | {} | {:.1}% | {} |",
                share.block_id, share.assignments, share.share_pct, share.empty_assignments
            )?;
        }
    }
    Ok(())
}
