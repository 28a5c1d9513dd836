use crate::GlobalArgs;
use crate::output;
use crate::session::Session;
use colored::Colorize;
use dokkuflow_resource::Engine;

pub async fn handle(args: &GlobalArgs) -> anyhow::Result<bool> {
    let session = Session::load(args)?;
    println!(
        "Manifest: {}",
        session.manifest_path.display().to_string().cyan()
    );

    let diags = Engine::validate(&session.manifest.resources);
    if !output::print_diagnostics(&diags) {
        eprintln!("{}", "✗ Manifest is invalid".red().bold());
        return Ok(false);
    }

    println!("{}", "✓ Manifest is valid".green().bold());
    println!("  {} resources", session.manifest.resources.len());
    match session.provider.ssh_host() {
        Ok(host) => println!("  host: {}", host.cyan()),
        Err(e) => println!("  {}", e.to_string().yellow()),
    }
    Ok(true)
}
