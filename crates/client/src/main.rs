//! CLI for interacting with the query escrow system.
//!
//! This binary provides commands for:
//! - Deploying databases and advertising host endpoints
//! - Staking, escrowing fees and voting on results
//! - Finalizing expired queries and claiming earnings
//! - Inspecting deposits, pending queries and balances

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use escrow_client::EscrowClient;
use escrow_mock_chain::types::FinalizedQueryRpc;
use escrow_types::{query_id_for, AccountId, DbId, Height, Manifest, Money, QueryId};

#[derive(Parser)]
#[command(name = "escrow-cli")]
#[command(about = "CLI for the query escrow system")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new database
    Deploy {
        #[arg(long)]
        sender: String,

        /// Storage fee attached to the deployment
        #[arg(long)]
        storage_fee: Money,

        #[arg(long)]
        name: String,

        /// Content identifier of the database code
        #[arg(long)]
        code_cid: String,

        #[arg(long, default_value = "")]
        license: String,

        /// Royalty on settled fees in basis points
        #[arg(long, default_value = "0")]
        royalty_bips: u16,

        /// Author account (defaults to the sender)
        #[arg(long)]
        author: Option<String>,
    },

    /// Advertise an API endpoint for a database (empty uri removes it)
    RegisterApi {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        db: DbId,

        #[arg(long, default_value = "")]
        uri: String,
    },

    /// Add to a security deposit
    Stake {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        db: DbId,

        #[arg(long)]
        amount: Money,
    },

    /// Withdraw a whole security deposit
    Withdraw {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        db: DbId,
    },

    /// Escrow a fee for a query
    EscrowFee {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        db: DbId,

        /// Query id; derived from --query when omitted
        #[arg(long, conflicts_with = "query")]
        qid: Option<String>,

        /// Query text to derive the id from
        #[arg(long)]
        query: Option<String>,

        #[arg(long)]
        amount: Money,

        /// Absolute deadline height
        #[arg(long, conflicts_with = "ttl")]
        deadline: Option<Height>,

        /// Deadline relative to the current height
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Vote for a query result
    SubmitResult {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        db: DbId,

        #[arg(long)]
        qid: String,

        #[arg(long)]
        result: String,
    },

    /// Settle expired queries and withdraw earnings
    Claim {
        #[arg(long)]
        sender: String,
    },

    /// Settle expired queries
    Finalize {
        #[arg(long, default_value = "keeper.near")]
        sender: String,
    },

    /// Move slashed funds to a target account (owner only)
    Recover {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        amount: Money,

        #[arg(long)]
        target: String,
    },

    /// Get database details
    GetDatabase {
        #[arg(long)]
        db: DbId,
    },

    /// List databases
    ListDatabases {
        #[arg(long, default_value = "0")]
        offset: u64,

        #[arg(long, default_value = "50")]
        limit: u64,
    },

    /// List API endpoints of a database
    Discover {
        #[arg(long)]
        db: DbId,
    },

    /// Get a security deposit
    GetDeposit {
        #[arg(long)]
        db: DbId,

        #[arg(long)]
        account: String,
    },

    /// Get fee, deadline and votes of a pending query
    GetQuery {
        #[arg(long)]
        db: DbId,

        #[arg(long)]
        qid: String,
    },

    /// Get unclaimed earnings
    GetBalance {
        #[arg(long)]
        account: String,
    },

    /// Get the slashed pool
    GetPool,

    /// List queries ready for settlement
    GetExpired,

    /// List scheduled transfers
    GetTransfers {
        #[arg(long)]
        account: Option<String>,
    },

    /// Print the query id of a query text
    QueryId {
        #[arg(long)]
        query: String,
    },

    /// Advance the chain (for testing)
    AdvanceBlocks {
        #[arg(long, default_value = "1")]
        blocks: u64,
    },

    /// Get the current block height
    BlockInfo,
}

fn print_settled(settled: &[FinalizedQueryRpc]) {
    for f in settled {
        println!("  {}/{}: {} (fee {})", f.db, f.qid, f.outcome, f.fee);
        println!("      Royalty: {} to {}", f.royalty, f.royalty_to);
        for (account, share) in &f.payouts {
            println!("      Paid: {} to {}", share, account);
        }
        for (account, amount) in &f.slashed {
            println!("      Slashed: {} from {}", amount, account);
        }
        if f.dust.0 > 0 {
            println!("      Dust: {}", f.dust);
        }
        if f.forfeited.0 > 0 {
            println!("      Forfeited: {}", f.forfeited);
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn escrow_fee_cmd(
    client: &EscrowClient,
    sender: &AccountId,
    db: DbId,
    qid: Option<String>,
    query: Option<String>,
    amount: Money,
    deadline: Option<Height>,
    ttl: Option<u64>,
) -> Result<()> {
    let qid: QueryId = match (qid, query) {
        (Some(qid), _) => qid.into(),
        (None, Some(query)) => query_id_for(&query),
        (None, None) => return Err(anyhow!("Either --qid or --query is required")),
    };
    let deadline = match (deadline, ttl) {
        (Some(deadline), _) => deadline,
        (None, Some(ttl)) => client.block_info().await?.height.saturating_add(ttl),
        (None, None) => return Err(anyhow!("Either --deadline or --ttl is required")),
    };

    let total = client.escrow_fee(sender, db, &qid, amount, deadline).await?;
    info!("Escrowed {} for query {}", amount, qid);
    println!("Fee escrowed");
    println!("  Query: {}/{}", db, qid);
    println!("  Deadline: {}", deadline);
    println!("  Total Fee: {}", total);
    Ok(())
}

async fn get_query_cmd(client: &EscrowClient, db: DbId, qid: &QueryId) -> Result<()> {
    match client.pending_query(db, qid).await? {
        Some(q) => {
            println!("Query {}/{}:", db, qid);
            println!("  Fee: {}", q.fee);
            println!("  Deadline: {}", q.deadline);
            let votes = client.votes_for(db, qid).await?;
            println!("  Votes: {}", votes.len());
            for vote in votes {
                println!("    {} -> {}", vote.account, vote.result);
            }
        }
        None => {
            println!("Query {}/{} is not pending", db, qid);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("escrow_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let client = EscrowClient::new(&cli.rpc)?;

    match cli.command {
        Commands::Deploy {
            sender,
            storage_fee,
            name,
            code_cid,
            license,
            royalty_bips,
            author,
        } => {
            let manifest = Manifest {
                author: author.map(AccountId::from).unwrap_or_default(),
                name,
                license,
                code_cid,
                royalty_bips,
            };
            let db = client.deploy(&sender.into(), storage_fee, manifest).await?;
            info!("Deployed database {}", db);
            println!("Database ID: {}", db);
        }

        Commands::RegisterApi { sender, db, uri } => {
            client.register_api(&sender.into(), db, &uri).await?;
            if uri.is_empty() {
                println!("Endpoint removed for database {}", db);
            } else {
                println!("Endpoint {} listed for database {}", uri, db);
            }
        }

        Commands::Stake { sender, db, amount } => {
            let balance = client.stake(&sender.into(), db, amount).await?;
            println!("Deposit on database {}: {}", db, balance);
        }

        Commands::Withdraw { sender, db } => {
            let amount = client.withdraw_stake(&sender.into(), db).await?;
            println!("Withdrew {} from database {}", amount, db);
        }

        Commands::EscrowFee {
            sender,
            db,
            qid,
            query,
            amount,
            deadline,
            ttl,
        } => {
            escrow_fee_cmd(&client, &sender.into(), db, qid, query, amount, deadline, ttl).await?;
        }

        Commands::SubmitResult {
            sender,
            db,
            qid,
            result,
        } => {
            let deadline = client
                .submit_result(&sender.into(), db, &qid.into(), &result.into())
                .await?;
            println!("Result submitted; query settles at height {}", deadline);
        }

        Commands::Claim { sender } => {
            let claim = client.claim(&sender.into()).await?;
            if !claim.settled.is_empty() {
                println!("Settled {} queries:", claim.settled.len());
                print_settled(&claim.settled);
            }
            println!("Claimed: {}", claim.amount);
        }

        Commands::Finalize { sender } => {
            let settled = client.finalize(&sender.into()).await?;
            if settled.is_empty() {
                println!("Nothing to settle");
            } else {
                println!("Settled {} queries:", settled.len());
                print_settled(&settled);
            }
        }

        Commands::Recover {
            sender,
            amount,
            target,
        } => {
            let amount = client.recover(&sender.into(), amount, &target.clone().into()).await?;
            println!("Recovered {} to {}", amount, target);
        }

        Commands::GetDatabase { db } => match client.database(db).await? {
            Some(d) => {
                println!("Database {}:", d.id);
                println!("  Name: {}", d.manifest.name);
                println!("  Owner: {}", d.owner);
                println!("  Author: {}", d.manifest.author);
                println!("  License: {}", d.manifest.license);
                println!("  Code: {}", d.manifest.code_cid);
                println!("  Royalty: {} bips", d.manifest.royalty_bips);
                println!("  Storage Deposit: {}", d.storage_deposit);
            }
            None => println!("Database {} not found", db),
        },

        Commands::ListDatabases { offset, limit } => {
            let databases = client.databases(offset, limit).await?;
            if databases.is_empty() {
                println!("No databases found");
            } else {
                println!("Databases:");
                for d in databases {
                    println!("  [{}] {} ({})", d.id, d.manifest.name, d.owner);
                }
            }
        }

        Commands::Discover { db } => {
            let endpoints = client.discover(db).await?;
            if endpoints.is_empty() {
                println!("No endpoints for database {}", db);
            }
            for uri in endpoints {
                println!("{}", uri);
            }
        }

        Commands::GetDeposit { db, account } => {
            let deposit = client.deposit_of(db, &account.into()).await?;
            println!("Deposit: {}", deposit);
        }

        Commands::GetQuery { db, qid } => {
            get_query_cmd(&client, db, &qid.into()).await?;
        }

        Commands::GetBalance { account } => {
            let balance = client.settled_balance(&account.into()).await?;
            println!("Fees: {}", balance.fees);
            println!("Royalties: {}", balance.royalties);
        }

        Commands::GetPool => {
            println!("Slashed pool: {}", client.slashed_pool().await?);
        }

        Commands::GetExpired => {
            let expired = client.expired_queries().await?;
            if expired.is_empty() {
                println!("No expired queries");
            }
            for key in expired {
                println!("{}", key);
            }
        }

        Commands::GetTransfers { account } => {
            let account = account.map(AccountId::from);
            for p in client.transfers(account.as_ref()).await? {
                println!("{} -> {} ({:?})", p.amount, p.to, p.reason);
            }
        }

        Commands::QueryId { query } => {
            println!("{}", query_id_for(&query));
        }

        Commands::AdvanceBlocks { blocks } => {
            let info = client.advance_blocks(blocks).await?;
            println!("Block advanced: height={}", info.height);
        }

        Commands::BlockInfo => {
            let info = client.block_info().await?;
            println!("Height: {}", info.height);
        }
    }

    Ok(())
}
