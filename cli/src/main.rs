// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # algosig CLI
//!
//! Entry point for the `algosig` binary. Parses CLI arguments, initializes
//! logging, and dispatches to one of the offline subcommands:
//!
//! - `keygen`: generate a keypair
//! - `address`: address of a public or secret key
//! - `multisig-address`: address of a multisig account
//! - `program-address`: address of a logic program
//! - `pay`: build and sign a payment
//! - `inspect`: decode a signed transaction to JSON

mod cli;
mod logging;
mod params;

use anyhow::{Context, Result};
use clap::Parser;

use algosig::transaction::{sign_transaction, TransactionBuilder, TransactionType};
use algosig::{program_address, Address, Keypair, MultisigMetadata, PublicKey, SignedTransaction};

use cli::{AlgosigCli, Commands};
use params::NodeParams;

fn main() -> Result<()> {
    let cli = AlgosigCli::parse();
    logging::init_logging(cli.verbose, cli.log_format);

    match cli.command {
        Commands::Keygen => keygen(),
        Commands::Address(args) => address(args),
        Commands::MultisigAddress(args) => multisig_address(args),
        Commands::ProgramAddress(args) => program_address_cmd(args),
        Commands::Pay(args) => pay(args),
        Commands::Inspect(args) => inspect(args),
    }
}

fn keygen() -> Result<()> {
    let keypair = Keypair::generate();
    tracing::info!(address = %keypair.address(), "keypair generated");

    println!("address     : {}", keypair.address());
    println!("public key  : {}", keypair.public_key().to_hex());
    println!("secret seed : {}", hex::encode(keypair.seed_bytes()));
    Ok(())
}

fn address(args: cli::AddressArgs) -> Result<()> {
    let address = match (args.public_key, args.secret_key) {
        (Some(pk), _) => {
            let pk = PublicKey::from_hex(&pk).context("invalid public key")?;
            Address::from_public_key(&pk)
        }
        (None, Some(sk)) => Keypair::from_hex(&sk).context("invalid secret key")?.address(),
        (None, None) => anyhow::bail!("either --public-key or --secret-key is required"),
    };
    println!("{}", address);
    Ok(())
}

fn multisig_address(args: cli::MultisigAddressArgs) -> Result<()> {
    let members = args
        .members
        .iter()
        .map(|m| {
            m.parse::<Address>()
                .with_context(|| format!("invalid member address {}", m))
        })
        .collect::<Result<Vec<_>>>()?;
    let metadata = MultisigMetadata::from_addresses(args.msig_version, args.threshold, &members)
        .context("invalid multisig parameters")?;
    println!("{}", metadata.address());
    Ok(())
}

fn program_address_cmd(args: cli::ProgramAddressArgs) -> Result<()> {
    let program = std::fs::read(&args.program)
        .with_context(|| format!("failed to read program {}", args.program.display()))?;
    if program.is_empty() {
        anyhow::bail!("program {} is empty", args.program.display());
    }
    println!("{}", program_address(&program));
    Ok(())
}

fn pay(args: cli::PayArgs) -> Result<()> {
    let keypair = Keypair::from_hex(&args.secret_key).context("invalid secret key")?;
    let node = NodeParams::load(&args.params)?;
    let suggested = node.suggested(args.validity)?;

    let sender = match &args.from {
        Some(from) => from.parse::<Address>().context("invalid --from address")?,
        None => keypair.address(),
    };
    let receiver: Address = args.to.parse().context("invalid --to address")?;

    let mut builder = TransactionBuilder::new(TransactionType::Payment)
        .sender(sender)
        .receiver(receiver)
        .amount(args.amount)
        .suggested_params(&suggested);
    if let Some(close) = &args.close_to {
        builder = builder.close_remainder_to(close.parse().context("invalid --close-to address")?);
    }
    if let Some(note) = &args.note {
        builder = builder.note(note.as_bytes().to_vec());
    }
    if let Some(fee) = args.fee {
        builder = builder.fee(fee);
    }
    let mut txn = builder.build().context("failed to build payment")?;
    if args.fee.is_none() && txn.fee() < node.min_fee {
        txn = txn.with_fee(node.min_fee);
    }

    let signed = sign_transaction(&txn, &keypair).context("failed to sign payment")?;
    let bytes = signed.to_bytes().context("failed to encode signed payment")?;
    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    let id = signed.id()?;
    tracing::info!(
        id = %id,
        fee = txn.fee(),
        bytes = bytes.len(),
        out = %args.out.display(),
        "payment signed"
    );
    println!("{}", id);
    Ok(())
}

fn inspect(args: cli::InspectArgs) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let signed = SignedTransaction::from_bytes(&bytes).context("not a canonical signed transaction")?;
    let verified = signed.verify();
    if let Err(e) = &verified {
        tracing::warn!(error = %e, "authorization does not verify");
    }

    let mut json = signed.to_json()?;
    json["verified"] = serde_json::Value::Bool(verified.is_ok());
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
