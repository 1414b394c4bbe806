//! List rules command implementation.

use anyhow::Result;
use boundaries_core::Boundaries;

/// Runs the list-rules command.
pub fn run(engine: &Boundaries) -> Result<()> {
    println!("Enabled rules:\n");
    println!("{:<10} {:<20} {:<10} Description", "Code", "Name", "Severity");
    println!("{}", "-".repeat(80));

    for rule in engine.boundary_rules() {
        println!(
            "{:<10} {:<20} {:<10} {}",
            rule.code(),
            rule.name(),
            rule.severity().to_string(),
            rule.description()
        );
    }
    for rule in engine.file_rules() {
        println!(
            "{:<10} {:<20} {:<10} {}",
            rule.code(),
            rule.name(),
            rule.severity().to_string(),
            rule.description()
        );
    }

    println!("\nElement types:");
    for descriptor in engine.settings().elements() {
        println!(
            "  {:<20} {} ({})",
            descriptor.element_type(),
            descriptor.patterns().join(", "),
            descriptor.mode()
        );
    }

    Ok(())
}
