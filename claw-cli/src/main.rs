//! CLAW CLI
//!
//! Command-line interface for CLAW dual-key stealth payments on Solana.

mod config;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use claw_core::constants::LAMPORTS_PER_SOL;
use claw_core::traits::{ProgressCallback, TransferRegistry};
use claw_core::types::{Identity, IdentityExport, MetaAddress, PublicKey, SecretKey};
use claw_crypto::{open_payload, ViewTagStats};
use claw_registry::{FileRegistry, MemoryRegistry};
use claw_scanner::{Scanner, ScannerConfig};
use claw_stealth::{
    claim, derive_address, generate_identity, identity_from_export, TransferBuilder,
    ViewingKeyExport,
};

use crate::config::CliConfig;

/// CLAW - Dual-Key Stealth Payments for Solana
#[derive(Parser)]
#[command(name = "claw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Registry file
    #[arg(long, global = true, env = "CLAW_REGISTRY_PATH")]
    registry: Option<PathBuf>,

    /// Identity file
    #[arg(long, global = true, env = "CLAW_KEYS_PATH")]
    keys: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new identity (spending + viewing keys)
    Generate {
        /// Output file (defaults to the configured identity file)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the meta-address of the loaded identity
    Show,

    /// Export scan-only credentials (viewing secret + spending public key)
    ExportViewing {
        /// Output file
        output: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Derive a one-time address for a recipient without recording a transfer
    Derive {
        /// Recipient's meta-address (128 hex chars)
        recipient: String,
    },

    /// Create a transfer record and append it to the registry
    Send {
        /// Recipient's meta-address (128 hex chars)
        recipient: String,
        /// Amount in SOL, e.g. 0.1
        amount: String,
        /// Encrypted memo
        #[arg(short, long)]
        memo: Option<String>,
        /// Plaintext sender hint (visible to everyone)
        #[arg(long)]
        hint: Option<String>,
    },

    /// Scan the registry for transfers addressed to you
    Scan {
        /// Scan with delegated scan-only credentials instead of the identity file
        #[arg(long)]
        viewing_key: Option<PathBuf>,
        /// Skip records older than this unix timestamp (inclusive)
        #[arg(long)]
        since: Option<u64>,
        /// Skip records newer than this unix timestamp (inclusive)
        #[arg(long)]
        until: Option<u64>,
    },

    /// Open a transfer and derive the key that spends it
    Claim {
        /// Record id
        id: Uuid,
        /// Print the spend scalar
        #[arg(long)]
        reveal: bool,
    },

    /// Show registry statistics
    Stats,

    /// Run benchmarks
    Bench {
        /// Number of transfers to generate
        #[arg(short, long, default_value = "2000")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_json);

    let config = CliConfig::from_env().context("Invalid configuration")?;

    let registry_path = cli.registry.unwrap_or(config.registry_path);
    let keys_path = cli.keys.unwrap_or(config.keys_path);
    debug!(?registry_path, ?keys_path, auto_save = config.auto_save, "Resolved paths");

    match cli.command {
        Commands::Generate { output, force } => {
            cmd_generate(output.as_deref().unwrap_or(&keys_path), force)
        }
        Commands::Show => cmd_show(&keys_path),
        Commands::ExportViewing { output, force } => {
            cmd_export_viewing(&keys_path, &output, force)
        }
        Commands::Derive { recipient } => cmd_derive(&recipient),
        Commands::Send {
            recipient,
            amount,
            memo,
            hint,
        } => {
            cmd_send(
                &registry_path,
                config.auto_save,
                &recipient,
                &amount,
                memo,
                hint,
            )
            .await
        }
        Commands::Scan {
            viewing_key,
            since,
            until,
        } => {
            let credentials = match viewing_key {
                Some(path) => load_viewing_key(&path)?,
                None => {
                    let identity = load_identity(&keys_path)?;
                    (
                        SecretKey::from_array(*identity.viewing.secret.as_bytes()),
                        identity.spending.public,
                    )
                }
            };
            cmd_scan(&registry_path, credentials, since, until).await
        }
        Commands::Claim { id, reveal } => cmd_claim(&registry_path, &keys_path, id, reveal).await,
        Commands::Stats => cmd_stats(&registry_path).await,
        Commands::Bench { count } => cmd_bench(count).await,
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose { "claw=debug,info" } else { "claw=info,warn" };
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()));

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// Generate a new identity
fn cmd_generate(output: &Path, force: bool) -> Result<()> {
    println!("{}", "🔑 Generating CLAW identity...".cyan().bold());

    let identity = generate_identity().context("Failed to generate keys")?;
    let export = identity.export();
    write_secret_json(output, &serde_json::to_string_pretty(&export)?, force)?;

    println!("{} {}", "✅ Keys saved to:".green(), output.display());
    println!("\n{}", "Meta-address (share this):".yellow().bold());
    println!("{}", export.meta_address);

    println!("\n{}", "⚠️  IMPORTANT: Keep your secret keys safe!".red().bold());
    println!("   spending_private moves funds; viewing_private reveals every payment.");

    Ok(())
}

/// Print the meta-address
fn cmd_show(keys_path: &Path) -> Result<()> {
    let identity = load_identity(keys_path)?;
    let meta = identity.meta_address();

    println!("{}", "Meta-address:".yellow().bold());
    println!("{}", meta);
    println!("   {} {}", "Spending:".dimmed(), meta.spending.to_base58());
    println!("   {} {}", "Viewing:".dimmed(), meta.viewing.to_base58());

    Ok(())
}

/// Export scan-only credentials
fn cmd_export_viewing(keys_path: &Path, output: &Path, force: bool) -> Result<()> {
    let identity = load_identity(keys_path)?;
    let export = ViewingKeyExport::from_identity(&identity);
    write_secret_json(output, &serde_json::to_string_pretty(&export)?, force)?;

    println!("{} {}", "✅ Viewing key saved to:".green(), output.display());
    println!("   Holders can find and read your payments but cannot spend them.");

    Ok(())
}

fn load_identity(path: &Path) -> Result<Identity> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read keys file {}", path.display()))?;
    let export: IdentityExport =
        serde_json::from_str(&contents).context("Keys file is not a CLAW identity")?;
    identity_from_export(&export).context("Keys file is inconsistent")
}

fn load_viewing_key(path: &Path) -> Result<(SecretKey, PublicKey)> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read viewing key {}", path.display()))?;
    let export: ViewingKeyExport =
        serde_json::from_str(&contents).context("Not a CLAW viewing key export")?;
    export.decode().context("Viewing key export is malformed")
}

fn write_secret_json(path: &Path, json: &str, force: bool) -> Result<()> {
    use std::io::Write;

    if path.exists() {
        if !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // Owner-only from the moment the file exists
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(json.as_bytes())
        .and_then(|_| file.sync_all())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// SENDING
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_recipient(recipient: &str) -> Result<MetaAddress> {
    recipient
        .parse::<MetaAddress>()
        .context("Invalid meta-address (expected 128 hex chars)")
}

/// Derive a one-time address
fn cmd_derive(recipient: &str) -> Result<()> {
    let meta = parse_recipient(recipient)?;
    let (stealth, _ephemeral) = derive_address(&meta).context("Failed to derive address")?;

    println!("\n{}", "✅ One-time address derived:".green().bold());
    println!("   {} {}", "Address:".yellow(), stealth.address.to_base58());
    println!("   {} {}", "View tag:".dimmed(), stealth.view_tag);
    println!(
        "   {} {}",
        "Ephemeral key:".dimmed(),
        stealth.ephemeral_public_key.to_hex()
    );
    println!(
        "\n   {}",
        "The ephemeral secret was discarded; use `claw send` to create a payable record.".dimmed()
    );

    Ok(())
}

/// Create and register a transfer
async fn cmd_send(
    registry_path: &Path,
    auto_save: u64,
    recipient: &str,
    amount: &str,
    memo: Option<String>,
    hint: Option<String>,
) -> Result<()> {
    let meta = parse_recipient(recipient)?;
    let lamports = parse_sol(amount)?;

    println!(
        "{} {} SOL",
        "💸 Creating stealth transfer of".cyan().bold(),
        format_sol(lamports)
    );

    let mut builder = TransferBuilder::new().recipient(meta).amount(lamports);
    if let Some(memo) = memo {
        builder = builder.memo(memo);
    }
    if let Some(hint) = hint {
        builder = builder.sender_hint(hint);
    }
    let record = builder.build().context("Failed to build transfer")?;

    // Held from load to flush so concurrent sends cannot drop each other's records
    let _lock = lock_registry(registry_path).await?;
    let registry = FileRegistry::with_auto_save(registry_path, auto_save)
        .await
        .context("Failed to open registry")?;
    registry
        .register(record.clone())
        .await
        .context("Registry rejected the transfer")?;
    registry.flush().await.context("Failed to save registry")?;
    info!(id = %record.id, view_tag = record.view_tag, "Transfer registered");

    println!("\n{}", "✅ Transfer registered:".green().bold());
    println!("   {} {}", "Id:".dimmed(), record.id);
    println!("   {} {}", "Pay to:".yellow(), record.stealth_address.to_base58());
    println!("   {} {}", "View tag:".dimmed(), record.view_tag);

    println!("\n{}", "ℹ️  Next step:".cyan());
    println!(
        "   Send {} SOL to the address above.",
        format_sol(lamports)
    );

    Ok(())
}

/// Takes an exclusive lock on `<registry>.lock`, released when the file is dropped.
async fn lock_registry(registry_path: &Path) -> Result<std::fs::File> {
    use fs2::FileExt;

    let lock_path = registry_path.with_extension("lock");
    if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("Failed to open {}", lock_path.display()))?;

    debug!(?lock_path, "Waiting for registry lock");
    tokio::task::spawn_blocking(move || file.lock_exclusive().map(|_| file))
        .await
        .context("Registry lock task failed")?
        .with_context(|| format!("Failed to lock {}", lock_path.display()))
}

/// Parses a decimal SOL amount into lamports.
fn parse_sol(input: &str) -> Result<u64> {
    let input = input.trim();
    let (whole, frac) = input.split_once('.').unwrap_or((input, ""));

    if whole.is_empty() && frac.is_empty() {
        bail!("Amount is empty");
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        bail!("Invalid amount {:?}", input);
    }
    if frac.len() > 9 {
        bail!("At most 9 decimal places (1 lamport)");
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().context("Amount too large")?
    };
    let frac: u64 = if frac.is_empty() {
        0
    } else {
        format!("{:0<9}", frac).parse()?
    };

    whole
        .checked_mul(LAMPORTS_PER_SOL)
        .and_then(|lamports| lamports.checked_add(frac))
        .context("Amount too large")
}

/// Formats lamports as SOL without trailing zeros.
fn format_sol(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let frac = lamports % LAMPORTS_PER_SOL;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:09}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECEIVING
// ═══════════════════════════════════════════════════════════════════════════════

/// Scan for payments
async fn cmd_scan(
    registry_path: &Path,
    (viewing_private, spending_public): (SecretKey, PublicKey),
    since: Option<u64>,
    until: Option<u64>,
) -> Result<()> {
    println!("{}", "🔎 Scanning for payments...".cyan().bold());

    let registry = FileRegistry::new(registry_path)
        .await
        .context("Failed to load registry file")?;

    if registry.is_empty() {
        println!("\n{}", "⚠️  Registry is empty. No transfers to scan.".yellow());
        return Ok(());
    }

    let scanner =
        Scanner::new(&viewing_private, &spending_public).context("Unusable viewing keys")?;

    let pb = ProgressBar::new(registry.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    let bar = pb.clone();
    let callback: ProgressCallback = Box::new(move |progress| {
        bar.set_length(progress.total);
        bar.set_position(progress.scanned);
    });

    let config = ScannerConfig {
        since,
        until,
        ..ScannerConfig::default()
    };
    let summary = scanner.scan_with_progress(&registry, config, callback).await?;
    pb.finish_and_clear();

    println!(
        "   Scanned {} transfers, {} passed the view tag filter",
        summary.stats.total_scanned, summary.stats.view_tag_matches
    );

    if summary.is_empty() {
        println!("\n{}", "No payments found.".yellow());
        return Ok(());
    }

    println!("\n{} {} payment(s) found:", "✅".green(), summary.len());
    for record in &summary.discovered {
        println!("   {} {}", "Id:".green(), record.id);
        println!("      Address: {}", record.stealth_address.to_base58());
        println!("      Time:    {}", format_timestamp(record.timestamp));

        match open_payload(
            &record.encrypted_amount,
            record.encrypted_memo.as_deref(),
            &record.ephemeral_public_key,
            &viewing_private,
        ) {
            Ok(payload) => {
                println!("      Amount:  {} SOL", format_sol(payload.amount));
                match payload.memo {
                    Some(Ok(memo)) => println!("      Memo:    {}", memo),
                    Some(Err(e)) => println!("      {} {}", "Memo unreadable:".red(), e),
                    None => {}
                }
            }
            Err(e) => println!("      {} {}", "Payload unreadable:".red(), e),
        }
    }

    Ok(())
}

/// Claim a payment
async fn cmd_claim(registry_path: &Path, keys_path: &Path, id: Uuid, reveal: bool) -> Result<()> {
    let identity = load_identity(keys_path)?;
    let registry = FileRegistry::new(registry_path)
        .await
        .context("Failed to load registry file")?;

    let record = registry
        .get(&id)
        .await?
        .with_context(|| format!("No transfer with id {}", id))?;

    let claimed = claim(&record, &identity.viewing.secret, &identity.spending.secret)
        .context("Failed to claim transfer")?;

    println!("{}", "✅ Transfer claimed:".green().bold());
    println!("   {} {}", "Address:".yellow(), claimed.stealth_address.to_base58());
    println!("   {} {} SOL", "Amount:".yellow(), format_sol(claimed.amount));
    if let Some(memo) = &claimed.memo {
        println!("   {} {}", "Memo:".yellow(), memo);
    }
    if let Some(e) = &claimed.memo_error {
        println!("   {} {}", "Memo unreadable:".red(), e);
    }

    if reveal {
        println!("\n{}", "⚠️  Spend scalar (controls the funds):".red().bold());
        println!("   {}", claimed.spend_scalar.to_hex());
    } else {
        println!("\n   {}", "Use --reveal to print the spend scalar.".dimmed());
    }

    Ok(())
}

fn format_timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Show registry statistics
async fn cmd_stats(registry_path: &Path) -> Result<()> {
    let registry = FileRegistry::new(registry_path)
        .await
        .context("Failed to load registry file")?;
    let stats = registry.stats().await?;

    println!("{} {}", "📊 Registry:".cyan().bold(), registry_path.display());
    println!("   Transfers:        {}", stats.total_count);
    println!("   With memo:        {}", stats.memo_count);
    println!("   View tags in use: {}/256", stats.occupied_tags());
    if let (Some(first), Some(last)) = (stats.earliest_timestamp, stats.latest_timestamp) {
        println!("   Earliest:         {}", format_timestamp(first));
        println!("   Latest:           {}", format_timestamp(last));
    }

    Ok(())
}

/// Run benchmarks
async fn cmd_bench(count: usize) -> Result<()> {
    println!("{} {} transfers", "📊 Benchmarking with".cyan().bold(), count);

    println!("\n{}", "1. Generating identities...".dimmed());
    let start = Instant::now();
    let me = generate_identity()?;
    let stranger = generate_identity()?;
    println!("   ✓ Key generation: {:?}", start.elapsed());

    println!("\n{}", "2. Creating transfers...".dimmed());
    let registry = MemoryRegistry::with_capacity(count);
    let mut tags = ViewTagStats::new();

    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    for i in 0..count {
        // One in a hundred is ours
        let to = if i % 100 == 0 { &me } else { &stranger };
        let record = TransferBuilder::new()
            .recipient(to.meta_address())
            .amount(i as u64)
            .build()?;
        tags.add(record.view_tag);
        registry.register(record).await?;
        pb.inc(1);
    }
    pb.finish();
    println!("   ✓ Created {} transfers: {:?}", count, start.elapsed());

    println!("\n{}", "3. Scanning...".dimmed());
    let scanner = Scanner::new(&me.viewing.secret, &me.spending.public)?;
    let start = Instant::now();
    let summary = scanner.scan_all(&registry).await?;
    let scan_time = start.elapsed();

    println!("   ✓ Scanned {} transfers: {:?}", count, scan_time);
    println!("   ✓ Found {} payments", summary.len());

    println!("\n{}", "📈 Results:".green().bold());
    println!(
        "   Scan rate: {:.0} transfers/sec",
        count as f64 / scan_time.as_secs_f64()
    );
    println!(
        "   View tag filter efficiency: {:.2}%",
        summary.stats.filter_efficiency()
    );
    println!(
        "   False positive rate: {:.4} (expected ~{:.4})",
        summary.stats.false_positive_rate(),
        1.0 / 256.0
    );
    println!("   View tag chi-squared (255 dof): {:.1}", tags.chi_squared());
    if let Some((tag, hits)) = tags.most_common() {
        println!(
            "   Most common tag: {} ({} hits, {:.1} expected)",
            tag,
            hits,
            tags.expected_uniform_count()
        );
    }

    let expected = count.div_ceil(100);
    if summary.len() == expected {
        println!("   {} All expected payments found!", "✅".green());
    } else {
        println!(
            "   {} Expected {}, found {}",
            "❌".red(),
            expected,
            summary.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::tempdir;
    use test_case::test_case;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test_case("1", 1_000_000_000 ; "whole")]
    #[test_case("0.1", 100_000_000 ; "tenth")]
    #[test_case(".5", 500_000_000 ; "leading dot")]
    #[test_case("2.", 2_000_000_000 ; "trailing dot")]
    #[test_case("0.000000001", 1 ; "one lamport")]
    #[test_case(" 3.25 ", 3_250_000_000 ; "padded")]
    fn test_parse_sol(input: &str, lamports: u64) {
        assert_eq!(parse_sol(input).unwrap(), lamports);
    }

    #[test_case("" ; "empty")]
    #[test_case("." ; "lone dot")]
    #[test_case("-1" ; "negative")]
    #[test_case("1e9" ; "exponent")]
    #[test_case("0.0000000001" ; "below one lamport")]
    #[test_case("18446744074" ; "overflow")]
    fn test_parse_sol_rejects(input: &str) {
        assert!(parse_sol(input).is_err());
    }

    #[test]
    fn test_format_sol() {
        assert_eq!(format_sol(100_000_000), "0.1");
        assert_eq!(format_sol(2 * LAMPORTS_PER_SOL), "2");
        assert_eq!(format_sol(1), "0.000000001");
        assert_eq!(parse_sol(&format_sol(123_456_789_000)).unwrap(), 123_456_789_000);
    }

    #[test]
    fn test_generate_then_load() {
        let dir = tempdir().unwrap();
        let keys = dir.path().join("nested/keys.json");

        cmd_generate(&keys, false).unwrap();
        let identity = load_identity(&keys).unwrap();
        assert!(cmd_generate(&keys, false).is_err());
        cmd_generate(&keys, true).unwrap();

        let regenerated = load_identity(&keys).unwrap();
        assert_ne!(identity.meta_address(), regenerated.meta_address());
    }

    #[test]
    fn test_viewing_key_export_file() {
        let dir = tempdir().unwrap();
        let keys = dir.path().join("keys.json");
        let viewing = dir.path().join("viewing.json");

        cmd_generate(&keys, false).unwrap();
        cmd_export_viewing(&keys, &viewing, false).unwrap();

        let identity = load_identity(&keys).unwrap();
        let (viewing_private, spending_public) = load_viewing_key(&viewing).unwrap();
        assert_eq!(viewing_private.as_bytes(), identity.viewing.secret.as_bytes());
        assert_eq!(spending_public, identity.spending.public);
    }

    #[tokio::test]
    async fn test_send_scan_claim_flow() {
        let dir = tempdir().unwrap();
        let keys = dir.path().join("keys.json");
        let registry_path = dir.path().join("registry.claw");

        cmd_generate(&keys, false).unwrap();
        let identity = load_identity(&keys).unwrap();
        let meta = identity.meta_address().to_hex();

        cmd_send(&registry_path, 0, &meta, "0.1", Some("rent".into()), None)
            .await
            .unwrap();

        let registry = FileRegistry::new(&registry_path).await.unwrap();
        let found = claw_scanner::scan(
            &registry,
            &identity.viewing.secret,
            &identity.spending.public,
            None,
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);

        let claimed = claim(&found[0], &identity.viewing.secret, &identity.spending.secret).unwrap();
        assert_eq!(claimed.amount, 100_000_000);
        assert_eq!(claimed.memo.as_deref(), Some("rent"));

        cmd_claim(&registry_path, &keys, found[0].id, false).await.unwrap();
        assert!(cmd_claim(&registry_path, &keys, Uuid::new_v4(), false)
            .await
            .is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sends_keep_every_record() {
        let dir = tempdir().unwrap();
        let keys = dir.path().join("keys.json");
        let registry_path = dir.path().join("registry.claw");

        cmd_generate(&keys, false).unwrap();
        let meta = load_identity(&keys).unwrap().meta_address().to_hex();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry_path = registry_path.clone();
                let meta = meta.clone();
                tokio::spawn(async move {
                    cmd_send(&registry_path, 0, &meta, "0.5", None, None).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let registry = FileRegistry::new(&registry_path).await.unwrap();
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn test_secret_file_is_owner_only() {
        let dir = tempdir().unwrap();
        let keys = dir.path().join("keys.json");

        cmd_generate(&keys, false).unwrap();
        cmd_generate(&keys, true).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&keys).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_argument_parsing_is_independent_of_config() {
        // Argument parsing never consults CLAW_AUTO_SAVE
        let cli = Cli::try_parse_from(["claw", "stats"]).unwrap();
        assert!(matches!(cli.command, Commands::Stats));
        assert!(CliConfig::from_lookup(|key| {
            (key == "CLAW_AUTO_SAVE").then(|| "often".to_string())
        })
        .is_err());
    }

    #[tokio::test]
    async fn test_send_rejects_bad_recipient() {
        let dir = tempdir().unwrap();
        let registry_path = dir.path().join("registry.claw");

        let result = cmd_send(&registry_path, 0, "abcd", "1", None, None).await;
        assert!(result.is_err());
        assert!(!registry_path.exists());
    }
}
