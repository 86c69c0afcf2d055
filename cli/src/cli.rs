//! # CLI Interface
//!
//! Defines the command-line argument structure for `algosig` using `clap`
//! derive. Every subcommand works offline; `pay` writes signed bytes to a
//! file for whatever submits them.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Offline key, address and signing tool.
#[derive(Parser, Debug)]
#[command(
    name = "algosig",
    about = "Canonical transaction encoding and offline signing",
    version,
    propagate_version = true
)]
pub struct AlgosigCli {
    /// Log output format. Logs go to stderr.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "ALGOSIG_LOG_FORMAT",
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// More log output: `-v` for command summaries, `-vv` for signing steps.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh keypair and print its address and keys.
    Keygen,
    /// Derive the address of a public or secret key.
    Address(AddressArgs),
    /// Derive the address of a multisig account.
    MultisigAddress(MultisigAddressArgs),
    /// Derive the address of a logic program.
    ProgramAddress(ProgramAddressArgs),
    /// Build and sign a payment.
    Pay(PayArgs),
    /// Decode a signed transaction and print it as JSON.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct AddressArgs {
    /// Hex-encoded 32-byte Ed25519 public key.
    #[arg(long)]
    pub public_key: Option<String>,

    /// Hex-encoded 32-byte seed or 64-byte secret key.
    #[arg(long, env = "ALGOSIG_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct MultisigAddressArgs {
    /// Multisig version. Named apart from the global `--version` flag.
    #[arg(long = "msig-version", default_value_t = 1)]
    pub msig_version: u8,

    /// Number of member signatures required.
    #[arg(long)]
    pub threshold: u8,

    /// Member addresses, in order. Order is part of the address.
    #[arg(required = true)]
    pub members: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ProgramAddressArgs {
    /// Compiled program bytes.
    pub program: PathBuf,
}

#[derive(Args, Debug)]
pub struct PayArgs {
    /// Hex-encoded seed or secret key of the signing account.
    ///
    /// **Prefer the environment variable** over the flag, so the key stays
    /// out of shell history.
    #[arg(long, env = "ALGOSIG_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Sender address. Defaults to the signing key's own address; set it
    /// when signing for a rekeyed account.
    #[arg(long)]
    pub from: Option<String>,

    /// Receiver address.
    #[arg(long)]
    pub to: String,

    /// Amount in base units.
    #[arg(long)]
    pub amount: u64,

    /// Close the sender's remaining balance to this address.
    #[arg(long)]
    pub close_to: Option<String>,

    /// UTF-8 note.
    #[arg(long)]
    pub note: Option<String>,

    /// Flat fee. Without it the node's per-byte rate is applied.
    #[arg(long)]
    pub fee: Option<u64>,

    /// Suggested-params JSON, as returned by a node's
    /// `/v2/transactions/params`.
    #[arg(long, env = "ALGOSIG_PARAMS")]
    pub params: PathBuf,

    /// Number of rounds the transaction stays valid for.
    #[arg(long, env = "ALGOSIG_VALIDITY", default_value_t = 1_000)]
    pub validity: u64,

    /// Where to write the signed transaction bytes.
    #[arg(long, short = 'o')]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// File holding one signed transaction.
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        AlgosigCli::command().debug_assert();
    }

    #[test]
    fn address_requires_exactly_one_key() {
        assert!(AlgosigCli::try_parse_from(["algosig", "address"]).is_err());
        assert!(AlgosigCli::try_parse_from([
            "algosig",
            "address",
            "--public-key",
            "00",
            "--secret-key",
            "00"
        ])
        .is_err());
        assert!(AlgosigCli::try_parse_from(["algosig", "address", "--public-key", "00"]).is_ok());
    }

    #[test]
    fn multisig_members_keep_order() {
        let cli = AlgosigCli::try_parse_from([
            "algosig",
            "multisig-address",
            "--threshold",
            "2",
            "B",
            "A",
        ])
        .unwrap();
        match cli.command {
            Commands::MultisigAddress(args) => {
                assert_eq!(args.msig_version, 1);
                assert_eq!(args.members, ["B", "A"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn logging_flags_are_global() {
        let cli = AlgosigCli::try_parse_from(["algosig", "keygen", "-vv", "--log-format", "json"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn multisig_version_flag_does_not_shadow_version() {
        let cli = AlgosigCli::try_parse_from([
            "algosig",
            "multisig-address",
            "--msig-version",
            "1",
            "--threshold",
            "1",
            "25NJQAMCWEFLPVKL73J4SZAHHIHOC4XT3KTCGJNPAINGR5YHKENMEF5QTE",
        ])
        .unwrap();
        match cli.command {
            Commands::MultisigAddress(args) => {
                assert_eq!(args.msig_version, 1);
                assert_eq!(args.threshold, 1);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let err = AlgosigCli::try_parse_from(["algosig", "multisig-address", "--version"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
