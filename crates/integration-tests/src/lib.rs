//! End-to-end integration tests for the query escrow system.
//!
//! These tests exercise the full query lifecycle:
//! 1. Database deployment and host staking
//! 2. Fee escrow and result voting
//! 3. Expiry and settlement
//! 4. Claims, withdrawals and recovery of slashed funds
//!
//! Most tests drive the module directly through `handlers::execute`, the
//! same entry point the mock chain uses. The last test runs the whole flow
//! over JSON-RPC.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use escrow_client::EscrowClient;
    use escrow_mock_chain::{start_server, MockChainServer};
    use escrow_module::{
        handlers, CallContext, CallOutput, EscrowCall, EscrowError, EscrowGenesisConfig,
        EscrowState, FinalizedQuery, HandlerResult, PaymentLog, SettlementOutcome, SlashRule,
    };
    use escrow_types::{
        AccountId, DbId, Height, Manifest, Money, PaymentReason, PendingQuery, QueryKey,
        ResultId, SettledBalance, Vote,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const MIN_STAKE: Money = 1_000;
    const START: Height = 100;

    /// Module state plus the pieces a chain would provide around it.
    struct Chain {
        state: EscrowState,
        transfers: PaymentLog,
        height: Height,
    }

    impl Chain {
        fn new(minority_slash: SlashRule) -> Self {
            let state = EscrowState::from_genesis(EscrowGenesisConfig {
                owner: "dao.near".into(),
                min_stake: MIN_STAKE,
                storage_cost: 1,
                settle_window: 120,
                minority_slash,
            })
            .unwrap();
            Self {
                state,
                transfers: PaymentLog::new(),
                height: START,
            }
        }

        fn call(&mut self, sender: &str, value: Money, call: EscrowCall) -> HandlerResult<CallOutput> {
            let ctx = CallContext {
                sender: sender.into(),
                block_height: self.height,
                value,
            };
            handlers::execute(&mut self.state, &ctx, call, &mut self.transfers)
        }

        fn advance(&mut self, blocks: u64) {
            self.height += blocks;
        }

        fn deploy(&mut self, owner: &str, royalty_bips: u16) -> DbId {
            let manifest = Manifest {
                name: format!("{owner}-db"),
                code_cid: "bafy-code".into(),
                royalty_bips,
                ..Default::default()
            };
            match self.call(owner, 1, EscrowCall::Deploy { manifest }).unwrap() {
                CallOutput::Deployed(db) => db,
                other => panic!("unexpected output {other:?}"),
            }
        }

        fn stake(&mut self, host: &str, db: DbId, amount: Money) {
            self.call(host, amount, EscrowCall::Stake { db }).unwrap();
        }

        fn escrow(&mut self, user: &str, db: DbId, qid: &str, fee: Money, deadline: Height) {
            self.call(
                user,
                fee,
                EscrowCall::EscrowFee {
                    db,
                    qid: qid.into(),
                    deadline,
                },
            )
            .unwrap();
        }

        fn submit(&mut self, host: &str, db: DbId, qid: &str, result: &str) -> HandlerResult<CallOutput> {
            self.call(
                host,
                0,
                EscrowCall::SubmitResult {
                    db,
                    qid: qid.into(),
                    result: result.into(),
                },
            )
        }

        fn finalize(&mut self) -> Vec<FinalizedQuery> {
            match self.call("keeper.near", 0, EscrowCall::Finalize).unwrap() {
                CallOutput::Finalized(settled) => settled,
                other => panic!("unexpected output {other:?}"),
            }
        }

        fn deposit(&self, db: DbId, account: &str) -> Money {
            self.state.deposit_of(db, &account.into())
        }

        fn balance(&self, account: &str) -> SettledBalance {
            self.state.settled_balance(&account.into())
        }

        /// Every token the engine holds or has paid out.
        fn ledger_total(&self) -> Money {
            let deposits: Money = self.state.deposits.values().sum();
            let pending: Money = self.state.queries.values().map(|q| q.fee).sum();
            let settled: Money = self
                .state
                .settled
                .values()
                .map(|b| b.fees + b.royalties)
                .sum();
            let paid: Money = self.transfers.payments.iter().map(|p| p.amount).sum();
            deposits + pending + settled + self.state.slashed_pool + paid
        }

        fn snapshot(&self) -> Snapshot {
            Snapshot {
                deposits: self.state.deposits.clone(),
                queries: self.state.queries.clone(),
                votes: self.state.votes.clone(),
                settled: self.state.settled.clone(),
                slashed_pool: self.state.slashed_pool,
                transfers: self.transfers.payments.len(),
            }
        }
    }

    #[derive(Debug, PartialEq)]
    struct Snapshot {
        deposits: BTreeMap<(DbId, AccountId), Money>,
        queries: BTreeMap<QueryKey, PendingQuery>,
        votes: BTreeMap<QueryKey, BTreeMap<AccountId, ResultId>>,
        settled: BTreeMap<AccountId, SettledBalance>,
        slashed_pool: Money,
        transfers: usize,
    }

    /// db0 with 5% royalty, hosts a, b and c staked, q1 funded with 1000
    /// until START + 10 and voted a/b -> r1, c -> r2.
    fn scenario(rule: SlashRule) -> (Chain, DbId) {
        let mut chain = Chain::new(rule);
        let db = chain.deploy("owner.near", 500);
        for host in ["a.near", "b.near", "c.near"] {
            chain.stake(host, db, MIN_STAKE);
        }
        chain.escrow("user.near", db, "q1", 1000, START + 10);
        chain.submit("a.near", db, "q1", "r1").unwrap();
        chain.submit("b.near", db, "q1", "r1").unwrap();
        chain.submit("c.near", db, "q1", "r2").unwrap();
        (chain, db)
    }

    fn assert_conserved(record: &FinalizedQuery) {
        assert_eq!(
            record.distributed(),
            Some(record.fee),
            "fee of {} not fully accounted for",
            record.key
        );
    }

    #[test]
    fn test_full_settlement_scenario() {
        let (mut chain, db) = scenario(SlashRule::default());

        // deadline not reached yet
        chain.advance(9);
        assert!(chain.finalize().is_empty());

        chain.advance(2);
        let settled = chain.finalize();
        assert_eq!(settled.len(), 1);

        let record = &settled[0];
        assert_eq!(record.key, QueryKey::new(db, "q1"));
        assert_eq!(record.royalty, 50);
        assert_eq!(record.royalty_to, AccountId::from("owner.near"));
        assert_eq!(
            record.outcome,
            SettlementOutcome::Agreed {
                result: "r1".into()
            }
        );
        assert_eq!(
            record.payouts,
            vec![("a.near".into(), 475), ("b.near".into(), 475)]
        );
        assert_eq!(record.dust, 0);
        assert_eq!(record.slashed, vec![("c.near".into(), 250)]);
        assert_conserved(record);

        assert_eq!(chain.balance("owner.near").royalties, 50);
        assert_eq!(chain.balance("a.near").fees, 475);
        assert_eq!(chain.balance("b.near").fees, 475);
        assert_eq!(chain.deposit(db, "c.near"), 750);
        assert_eq!(chain.deposit(db, "a.near"), MIN_STAKE);
        assert_eq!(chain.state.slashed_pool, 250);

        let key = QueryKey::new(db, "q1");
        assert!(chain.state.pending_query(&key).is_none());
        assert!(chain.state.votes_for(&key).is_empty());
    }

    #[test]
    fn test_legacy_divisor_slashes_whole_deposit() {
        let (mut chain, db) = scenario(SlashRule::LegacyDivisor(2500));
        chain.advance(11);
        let settled = chain.finalize();

        // 1000 * 10000 / 2500 = 4000, clamped to the deposit
        assert_eq!(settled[0].slashed, vec![("c.near".into(), MIN_STAKE)]);
        assert_eq!(chain.deposit(db, "c.near"), 0);
        assert_eq!(chain.state.slashed_pool, MIN_STAKE);
        assert_conserved(&settled[0]);
    }

    #[test]
    fn test_no_double_settlement() {
        let (mut chain, _) = scenario(SlashRule::default());
        chain.advance(11);
        assert_eq!(chain.finalize().len(), 1);

        let before = chain.snapshot();
        assert!(chain.finalize().is_empty());
        assert!(chain.finalize().is_empty());
        assert_eq!(chain.snapshot(), before);
    }

    #[test]
    fn test_expired_query_without_votes_is_forfeited() {
        let mut chain = Chain::new(SlashRule::default());
        let db = chain.deploy("owner.near", 500);
        chain.stake("a.near", db, MIN_STAKE);
        chain.escrow("user.near", db, "q1", 700, START + 1);

        chain.advance(1);
        let settled = chain.finalize();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].outcome, SettlementOutcome::NoQuorum);
        assert_eq!(settled[0].royalty, 35);
        assert_eq!(settled[0].forfeited, 665);
        assert_conserved(&settled[0]);

        assert_eq!(chain.state.slashed_pool, 665);
        assert!(chain.state.queries.is_empty());
        assert!(chain.state.votes.is_empty());
        assert_eq!(chain.deposit(db, "a.near"), MIN_STAKE);
    }

    #[test]
    fn test_three_way_split_forfeits_without_slashing() {
        let mut chain = Chain::new(SlashRule::default());
        let db = chain.deploy("owner.near", 500);
        for host in ["a.near", "b.near", "c.near"] {
            chain.stake(host, db, MIN_STAKE);
        }
        chain.escrow("user.near", db, "q1", 900, START + 10);
        chain.submit("a.near", db, "q1", "r1").unwrap();
        chain.submit("b.near", db, "q1", "r2").unwrap();
        chain.submit("c.near", db, "q1", "r3").unwrap();

        chain.advance(10);
        let settled = chain.finalize();
        assert_eq!(settled[0].outcome, SettlementOutcome::NoQuorum);
        assert_eq!(settled[0].forfeited, 855);
        assert!(settled[0].payouts.is_empty());
        assert!(settled[0].slashed.is_empty());
        assert_conserved(&settled[0]);

        for host in ["a.near", "b.near", "c.near"] {
            assert_eq!(chain.deposit(db, host), MIN_STAKE);
            assert!(chain.balance(host).is_zero());
        }
        assert_eq!(chain.state.slashed_pool, 855);
    }

    #[test]
    fn test_uneven_split_dust_goes_to_pool() {
        let mut chain = Chain::new(SlashRule::default());
        let db = chain.deploy("owner.near", 0);
        for host in ["a.near", "b.near", "c.near", "d.near"] {
            chain.stake(host, db, MIN_STAKE);
        }
        chain.escrow("user.near", db, "q1", 1000, START + 10);
        for host in ["a.near", "b.near", "c.near"] {
            chain.submit(host, db, "q1", "r1").unwrap();
        }
        chain.submit("d.near", db, "q1", "r2").unwrap();

        chain.advance(10);
        let settled = chain.finalize();
        let record = &settled[0];

        // 1000 * (10000 / 3) / 10000 = 333
        assert!(record.payouts.iter().all(|(_, share)| *share == 333));
        assert_eq!(record.dust, 1);
        assert_eq!(record.slashed, vec![("d.near".into(), 250)]);
        assert_conserved(record);
        assert_eq!(chain.state.slashed_pool, 251);
    }

    #[test]
    fn test_understaked_host_cannot_vote() {
        let mut chain = Chain::new(SlashRule::default());
        let db = chain.deploy("owner.near", 500);
        chain.stake("a.near", db, MIN_STAKE);
        chain.stake("b.near", db, MIN_STAKE);
        chain.stake("d.near", db, MIN_STAKE - 1);
        chain.escrow("user.near", db, "q1", 1000, START + 10);

        let err = chain.submit("d.near", db, "q1", "r2").unwrap_err();
        assert_eq!(
            err,
            EscrowError::InsufficientStake {
                required: MIN_STAKE,
                got: MIN_STAKE - 1
            }
        );
        assert!(!err.is_fatal());

        chain.submit("a.near", db, "q1", "r1").unwrap();
        chain.submit("b.near", db, "q1", "r1").unwrap();
        assert_eq!(
            chain.state.votes_for(&QueryKey::new(db, "q1")),
            vec![Vote::new("a.near", "r1"), Vote::new("b.near", "r1")]
        );

        chain.advance(10);
        let settled = chain.finalize();
        assert_eq!(settled[0].payouts.len(), 2);
        assert!(settled[0].slashed.is_empty());
        assert_eq!(chain.deposit(db, "d.near"), MIN_STAKE - 1);
    }

    #[test]
    fn test_claim_settles_expired_queries_first() {
        let (mut chain, db) = scenario(SlashRule::default());
        chain.advance(11);

        match chain.call("a.near", 0, EscrowCall::Claim).unwrap() {
            CallOutput::Claimed { amount, settled } => {
                assert_eq!(amount, 475);
                assert_eq!(settled.len(), 1);
            }
            other => panic!("unexpected output {other:?}"),
        }
        assert_eq!(chain.transfers.total_to(&"a.near".into()), 475);
        assert!(chain.balance("a.near").is_zero());
        assert_eq!(chain.balance("b.near").fees, 475);
        assert!(chain.state.pending_query(&QueryKey::new(db, "q1")).is_none());

        // owner claims royalties, then nothing is left
        match chain.call("owner.near", 0, EscrowCall::Claim).unwrap() {
            CallOutput::Claimed { amount, settled } => {
                assert_eq!(amount, 50);
                assert!(settled.is_empty());
            }
            other => panic!("unexpected output {other:?}"),
        }
        let payments = chain.transfers.payments.len();
        match chain.call("owner.near", 0, EscrowCall::Claim).unwrap() {
            CallOutput::Claimed { amount, .. } => assert_eq!(amount, 0),
            other => panic!("unexpected output {other:?}"),
        }
        assert_eq!(chain.transfers.payments.len(), payments);
    }

    #[test]
    fn test_recover_slashed_funds() {
        let (mut chain, _) = scenario(SlashRule::default());
        chain.advance(11);
        chain.finalize();
        assert_eq!(chain.state.slashed_pool, 250);

        let recover = |amount| EscrowCall::Recover {
            amount,
            target: "treasury.near".into(),
        };

        assert_eq!(
            chain.call("owner.near", 0, recover(10)),
            Err(EscrowError::NotAuthorized)
        );
        assert_eq!(
            chain.call("dao.near", 0, recover(251)),
            Err(EscrowError::InsufficientPool {
                requested: 251,
                available: 250
            })
        );
        assert_eq!(chain.call("dao.near", 0, recover(0)), Err(EscrowError::ZeroAmount));

        chain.call("dao.near", 0, recover(250)).unwrap();
        assert_eq!(chain.state.slashed_pool, 0);
        let payment = chain.transfers.payments.last().unwrap();
        assert_eq!(payment.to, AccountId::from("treasury.near"));
        assert_eq!(payment.amount, 250);
        assert_eq!(payment.reason, PaymentReason::Recovery);
    }

    #[test]
    fn test_later_payment_overrides_deadline() {
        let mut chain = Chain::new(SlashRule::default());
        let db = chain.deploy("owner.near", 500);
        chain.stake("a.near", db, MIN_STAKE);
        chain.stake("b.near", db, MIN_STAKE);

        // first submission opens the default window
        match chain.submit("a.near", db, "q2", "r1").unwrap() {
            CallOutput::ResultSubmitted { deadline } => assert_eq!(deadline, START + 120),
            other => panic!("unexpected output {other:?}"),
        }

        // a payment shortens it
        chain.escrow("user.near", db, "q2", 100, START + 5);
        let key = QueryKey::new(db, "q2");
        assert_eq!(chain.state.pending_query(&key).unwrap().deadline, START + 5);

        chain.advance(5);
        assert_eq!(
            chain.submit("b.near", db, "q2", "r1"),
            Err(EscrowError::SettlementTimedOut {
                deadline: START + 5,
                height: START + 5
            })
        );

        let settled = chain.finalize();
        assert_eq!(settled[0].payouts, vec![("a.near".into(), 95)]);
        assert_eq!(settled[0].royalty, 5);
    }

    #[test]
    fn test_later_payment_extends_deadline() {
        let mut chain = Chain::new(SlashRule::default());
        let db = chain.deploy("owner.near", 0);
        chain.stake("a.near", db, MIN_STAKE);
        chain.escrow("user.near", db, "q1", 10, START + 5);
        chain.escrow("other.near", db, "q1", 15, START + 50);

        chain.advance(10);
        assert!(chain.finalize().is_empty());
        chain.submit("a.near", db, "q1", "r1").unwrap();

        chain.advance(40);
        let settled = chain.finalize();
        assert_eq!(settled[0].fee, 25);
        assert_eq!(settled[0].payouts, vec![("a.near".into(), 25)]);
    }

    #[test]
    fn test_revote_replaces_previous_vote() {
        let mut chain = Chain::new(SlashRule::default());
        let db = chain.deploy("owner.near", 0);
        chain.stake("a.near", db, MIN_STAKE);
        chain.submit("a.near", db, "q1", "r1").unwrap();
        chain.submit("a.near", db, "q1", "r2").unwrap();

        assert_eq!(
            chain.state.votes_for(&QueryKey::new(db, "q1")),
            vec![Vote::new("a.near", "r2")]
        );
    }

    #[test]
    fn test_unfunded_query_purges_votes_without_slashing() {
        let mut chain = Chain::new(SlashRule::default());
        let db = chain.deploy("owner.near", 500);
        chain.stake("a.near", db, MIN_STAKE);
        chain.stake("c.near", db, MIN_STAKE);
        chain.submit("a.near", db, "q3", "r1").unwrap();
        chain.submit("c.near", db, "q3", "r2").unwrap();

        chain.advance(120);
        let settled = chain.finalize();
        assert_eq!(settled[0].outcome, SettlementOutcome::Unfunded);
        assert!(settled[0].slashed.is_empty());
        assert_eq!(chain.deposit(db, "c.near"), MIN_STAKE);
        assert!(chain.state.votes.is_empty());
        assert_eq!(chain.state.slashed_pool, 0);
    }

    #[test]
    fn test_withdraw_removes_listing_and_returns_deposit() {
        let mut chain = Chain::new(SlashRule::default());
        let db = chain.deploy("owner.near", 0);
        chain.stake("a.near", db, MIN_STAKE);
        chain
            .call(
                "a.near",
                0,
                EscrowCall::RegisterApi {
                    db,
                    uri: "https://a.example/api".into(),
                },
            )
            .unwrap();
        assert_eq!(chain.state.registry.discover(db), vec!["https://a.example/api"]);

        chain.call("a.near", 0, EscrowCall::WithdrawStake { db }).unwrap();
        assert!(chain.state.registry.discover(db).is_empty());
        assert_eq!(chain.transfers.total_to(&"a.near".into()), MIN_STAKE);
        assert_eq!(
            chain.call("a.near", 0, EscrowCall::WithdrawStake { db }),
            Err(EscrowError::NoDeposit)
        );
    }

    /// Random calls must never create or destroy value, and rejected calls
    /// must leave the state untouched.
    #[test]
    fn test_randomized_conservation() {
        let hosts = ["h0.near", "h1.near", "h2.near", "h3.near"];
        let users = ["u0.near", "u1.near"];
        let queries = ["q0", "q1", "q2"];
        let results = ["r0", "r1"];

        for seed in 0..8u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut chain = Chain::new(SlashRule::default());
            let dbs = [chain.deploy("owner0.near", 700), chain.deploy("owner1.near", 0)];
            let mut paid_in: Money = 0;

            for _ in 0..400 {
                let db = dbs[rng.gen_range(0..dbs.len())];
                let host = hosts[rng.gen_range(0..hosts.len())];
                let qid = queries[rng.gen_range(0..queries.len())];
                let before = chain.snapshot();

                let (value, result) = match rng.gen_range(0..9) {
                    0 | 1 => {
                        let amount = rng.gen_range(0..1500);
                        (amount, chain.call(host, amount, EscrowCall::Stake { db }))
                    }
                    2 => (0, chain.call(host, 0, EscrowCall::WithdrawStake { db })),
                    3 => {
                        let user = users[rng.gen_range(0..users.len())];
                        let amount = rng.gen_range(0..500);
                        let deadline = chain.height + rng.gen_range(0..20);
                        let call = EscrowCall::EscrowFee {
                            db,
                            qid: qid.into(),
                            deadline,
                        };
                        (amount, chain.call(user, amount, call))
                    }
                    4 | 5 => {
                        let result = results[rng.gen_range(0..results.len())];
                        (0, chain.submit(host, db, qid, result))
                    }
                    6 => {
                        chain.advance(rng.gen_range(0..6));
                        (0, chain.call("keeper.near", 0, EscrowCall::Finalize))
                    }
                    7 => {
                        let claimer = if rng.gen_bool(0.3) { "owner0.near" } else { host };
                        (0, chain.call(claimer, 0, EscrowCall::Claim))
                    }
                    _ => {
                        let call = EscrowCall::Recover {
                            amount: rng.gen_range(0..200),
                            target: "treasury.near".into(),
                        };
                        (0, chain.call("dao.near", 0, call))
                    }
                };

                match result {
                    Ok(output) => {
                        paid_in += value;
                        let settled = match output {
                            CallOutput::Finalized(settled) => settled,
                            CallOutput::Claimed { settled, .. } => settled,
                            _ => Vec::new(),
                        };
                        settled.iter().for_each(assert_conserved);
                    }
                    Err(e) => {
                        assert!(!e.is_fatal(), "seed {seed}: {e}");
                        assert_eq!(chain.snapshot(), before, "seed {seed}: {e} mutated state");
                    }
                }
                assert_eq!(chain.ledger_total(), paid_in, "seed {seed}");
            }

            // settle everything and check nothing is left pending
            chain.advance(200);
            chain.finalize();
            assert!(chain.state.queries.is_empty());
            assert!(chain.state.votes.is_empty());
            assert_eq!(chain.ledger_total(), paid_in, "seed {seed}");
        }
    }

    #[tokio::test]
    async fn test_full_flow_over_rpc() {
        let server = MockChainServer::new(EscrowGenesisConfig {
            owner: "dao.near".into(),
            min_stake: MIN_STAKE,
            storage_cost: 1,
            settle_window: 120,
            minority_slash: SlashRule::default(),
        })
        .unwrap();
        let (addr, handle) = start_server("127.0.0.1:0".parse().unwrap(), server)
            .await
            .unwrap();
        let client = EscrowClient::new(&format!("http://{addr}")).unwrap();

        let owner = AccountId::from("owner.near");
        let hosts: Vec<AccountId> = ["a.near", "b.near", "c.near"]
            .into_iter()
            .map(AccountId::from)
            .collect();

        let db = client
            .deploy(
                &owner,
                1,
                Manifest {
                    name: "weather".into(),
                    code_cid: "bafy-code".into(),
                    royalty_bips: 500,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            client.database(db).await.unwrap().unwrap().manifest.author,
            owner
        );

        for host in &hosts {
            assert_eq!(client.stake(host, db, MIN_STAKE).await.unwrap(), MIN_STAKE);
        }
        client
            .register_api(&hosts[0], db, "https://a.example/api")
            .await
            .unwrap();
        assert_eq!(client.discover(db).await.unwrap().len(), 1);

        client.advance_blocks(START).await.unwrap();
        let (qid, total) = client
            .escrow_fee_for_query(&"user.near".into(), db, "SELECT 1", 1000, START + 10)
            .await
            .unwrap();
        assert_eq!(total, 1000);
        assert_eq!(qid, escrow_types::query_id_for("SELECT 1"));

        for (host, result) in hosts.iter().zip(["r1", "r1", "r2"]) {
            client
                .submit_result(host, db, &qid, &result.into())
                .await
                .unwrap();
        }
        assert_eq!(client.votes_for(db, &qid).await.unwrap().len(), 3);

        // understaked host is rejected
        let err = client
            .submit_result(&"d.near".into(), db, &qid, &"r2".into())
            .await
            .unwrap_err();
        assert!(err.is_rejected());

        client.advance_blocks(11).await.unwrap();
        let claim = client.claim(&hosts[0]).await.unwrap();
        assert_eq!(claim.amount.0, 475);
        assert_eq!(claim.settled.len(), 1);

        assert!(client.pending_query(db, &qid).await.unwrap().is_none());
        assert_eq!(client.settled_balance(&owner).await.unwrap().royalties, 50);
        assert_eq!(client.deposit_of(db, &hosts[2]).await.unwrap(), 750);
        assert_eq!(client.slashed_pool().await.unwrap(), 250);

        let err = client
            .recover(&owner, 250, &"treasury.near".into())
            .await
            .unwrap_err();
        assert!(err.is_rejected());
        client
            .recover(&"dao.near".into(), 250, &"treasury.near".into())
            .await
            .unwrap();

        let transfers = client.transfers(None).await.unwrap();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].to, hosts[0]);
        assert_eq!(transfers[1].amount.0, 250);

        handle.stop().unwrap();
    }
}
