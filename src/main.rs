// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use etkinlik_kayit::{Backend, Config, RecordStore, SqliteStore, VERSION};
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("check") => run_check()?,
        Some("list") => run_list()?,
        // Terminal form (default)
        _ => run_ui_mode()?,
    }

    Ok(())
}

fn run_check() -> Result<()> {
    println!("🔧 Event Kayıt v{VERSION} - Configuration Check");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let path = Config::default_path();
    let config = Config::load(&path)?;
    println!("✓ Loaded {}", path.display());
    println!("  {:?}", config);

    let store = config.open_store()?;
    println!("✓ Store ready: {} ({})", store.name(), config.store_description());
    println!("✓ Confirmation number field: {}", config.confirmation_field);

    Ok(())
}

fn run_list() -> Result<()> {
    let config = Config::load(&Config::default_path())?;
    if config.backend != Backend::Sqlite {
        bail!("list only reads the local sqlite store; set backend to \"sqlite\"");
    }

    let store = SqliteStore::open(&config.sqlite_path)?;
    let rows = store.all()?;

    println!("📋 {} registrations in {}", rows.len(), config.sqlite_path.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for row in rows {
        let record = &row.record;
        let guest_count = record.guest_entries().map(|g| g.len()).unwrap_or(0);
        println!(
            "#{:<5} {:<30} {:>3}  {}  üye: {}  misafir: {}  ({})",
            row.id,
            record.full_name,
            record.age,
            record.phone,
            record.club_member,
            guest_count,
            row.created_at
        );
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    use etkinlik_kayit::{logging, Registrar};
    use std::path::Path;

    println!("🖥️  Loading Event Kayıt form...\n");

    logging::init_file(Path::new("etkinlik-kayit.log"))?;

    let config = Config::load(&Config::default_path())?;
    let store = config.open_store()?;
    let registrar = Registrar::new(store, config.confirmation_field.clone());
    tracing::info!(version = VERSION, store = registrar.store_name(), "terminal form started");
    let runtime = tokio::runtime::Runtime::new()?;

    let mut app = ui::App::new(registrar, runtime);
    ui::run_ui(&mut app)?;

    if let Some(id) = app.session.confirmation_id() {
        println!("Kayıt Numaranız: {id}");
    }

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ TUI not available!");
    eprintln!("   Build with: cargo build --features tui");
    eprintln!("   Or use: cargo run -- check");
    std::process::exit(1);
}
