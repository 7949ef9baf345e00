#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use crate::{
        constants::BLOCK_REWARD,
        error::{ChainError, InvalidBlockError},
        payload::{build_payload, BuildPayloadArgs},
        process_block, Blockchain,
    };

    use blockreplay_core::{
        types::{
            compute_transactions_root, Block, BlockHeader, ChainConfig, Genesis, GenesisAccount,
            Log, ReceiptOutcome, Transaction, TxKind,
        },
        Address, Bloom, Bytes, H256, U256,
    };
    use blockreplay_storage::StateStore;
    use blockreplay_vm::{Computation, EvmError, Interpreter};
    use hex_literal::hex;
    use secp256k1::SecretKey;

    const CHAIN_ID: u64 = 1337;
    const GAS_PRICE: u64 = 1_000_000_000;

    fn ether(amount: u64) -> U256 {
        U256::from(amount) * U256::exp10(18)
    }

    fn secret_key() -> SecretKey {
        SecretKey::from_slice(&hex!(
            "4646464646464646464646464646464646464646464646464646464646464646"
        ))
        .unwrap()
    }

    fn sender() -> Address {
        Transaction::default()
            .sign(&secret_key(), None)
            .sender()
            .unwrap()
    }

    fn contract() -> Address {
        Address::repeat_byte(0xcc)
    }

    fn chain_config(byzantium_block: u64) -> ChainConfig {
        ChainConfig {
            chain_id: CHAIN_ID,
            homestead_block: Some(0),
            eip150_block: Some(0),
            eip155_block: Some(0),
            eip158_block: Some(0),
            byzantium_block: Some(byzantium_block),
            ..Default::default()
        }
    }

    fn genesis(config: ChainConfig) -> Genesis {
        let mut alloc = HashMap::new();
        alloc.insert(
            sender(),
            GenesisAccount {
                code: Bytes::new(),
                storage: HashMap::new(),
                balance: ether(100),
                nonce: 0,
            },
        );
        alloc.insert(
            contract(),
            GenesisAccount {
                code: Bytes::from_static(&hex!("6000")),
                storage: HashMap::new(),
                balance: U256::zero(),
                nonce: 1,
            },
        );
        Genesis {
            config,
            alloc,
            coinbase: Address::zero(),
            difficulty: U256::from(131_072),
            extra_data: Bytes::new(),
            gas_limit: 8_000_000,
            nonce: 0x42,
            mix_hash: H256::zero(),
            timestamp: 0,
        }
    }

    fn test_chain() -> Blockchain {
        Blockchain::from_genesis(&genesis(chain_config(0))).unwrap()
    }

    fn transfer(nonce: u64, to: Address, value: U256) -> Transaction {
        Transaction {
            nonce,
            gas_price: U256::from(GAS_PRICE),
            gas_limit: 21_000,
            to: TxKind::Call(to),
            value,
            ..Default::default()
        }
        .sign(&secret_key(), Some(CHAIN_ID))
    }

    fn new_block<I: Interpreter>(
        chain: &Blockchain<I>,
        coinbase: Address,
        transactions: Vec<Transaction>,
        ommers: Vec<BlockHeader>,
    ) -> Block {
        let head = chain.canonical_head().unwrap();
        let args = BuildPayloadArgs {
            parent: head.hash,
            timestamp: (head.number + 1) * 13,
            coinbase,
            difficulty: U256::from(131_072),
            gas_limit: None,
            extra_data: Bytes::new(),
            transactions,
            ommers,
        };
        build_payload(&args, chain).unwrap()
    }

    fn import_empty_blocks(chain: &mut Blockchain, count: u64) -> Vec<Block> {
        (0..count)
            .map(|index| {
                let coinbase = Address::from_low_u64_be(0x1000 + index);
                let block = new_block(&*chain, coinbase, vec![], vec![]);
                chain.import_block(&block).unwrap();
                block
            })
            .collect()
    }

    #[test]
    fn empty_block_pays_exact_base_reward() {
        let mut chain = test_chain();
        let coinbase = Address::repeat_byte(0xc1);
        let block = new_block(&chain, coinbase, vec![], vec![]);
        let hash = chain.import_block(&block).unwrap();

        assert_eq!(chain.balance(coinbase), BLOCK_REWARD);
        assert_eq!(BLOCK_REWARD, ether(5));
        let head = chain.canonical_head().unwrap();
        assert_eq!(head.hash, hash);
        assert_eq!(head.number, 1);
        assert_eq!(chain.receipts(hash).unwrap(), Some(vec![]));
    }

    #[test]
    fn uncle_reward_depends_on_depth() {
        let mut chain = test_chain();
        let blocks = import_empty_blocks(&mut chain, 2);

        // Sibling of block 2, included by block 3 at depth 1
        let uncle_coinbase = Address::repeat_byte(0xd1);
        let uncle = BlockHeader {
            parent_hash: blocks[0].hash(),
            number: 2,
            coinbase: uncle_coinbase,
            extra_data: Bytes::from_static(b"uncle"),
            ..blocks[1].header.clone()
        };
        let coinbase = Address::repeat_byte(0xc3);
        let block = new_block(&chain, coinbase, vec![], vec![uncle.clone()]);
        let hash = chain.import_block(&block).unwrap();

        assert_eq!(chain.balance(uncle_coinbase), BLOCK_REWARD * 7 / 8);
        assert_eq!(chain.balance(coinbase), BLOCK_REWARD + BLOCK_REWARD / 32);

        let stored = chain
            .store()
            .get_ommers(block.header.ommers_hash)
            .unwrap()
            .unwrap();
        assert_eq!(stored, vec![uncle]);
        assert_eq!(chain.canonical_head().unwrap().hash, hash);
    }

    #[test]
    fn uncle_too_deep_is_rejected() {
        let mut chain = test_chain();
        let blocks = import_empty_blocks(&mut chain, 7);
        let uncle = BlockHeader {
            coinbase: Address::repeat_byte(0xd1),
            ..blocks[0].header.clone()
        };
        let block = new_block(&chain, Address::repeat_byte(0xc8), vec![], vec![uncle]);
        let result = chain.import_block(&block);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(InvalidBlockError::InvalidUncleDepth {
                number: 8,
                uncle_number: 1,
                ..
            }))
        ));
    }

    #[test]
    fn transfers_pay_fees_and_produce_receipts() {
        let mut chain = test_chain();
        let recipient = Address::repeat_byte(0xee);
        let coinbase = Address::repeat_byte(0xc1);
        let transactions = vec![
            transfer(0, recipient, ether(1)),
            transfer(1, recipient, ether(2)),
        ];
        let block = new_block(&chain, coinbase, transactions, vec![]);
        let hash = chain.import_block(&block).unwrap();

        let fees = U256::from(2 * 21_000 * GAS_PRICE);
        assert_eq!(chain.balance(recipient), ether(3));
        assert_eq!(chain.balance(sender()), ether(100) - ether(3) - fees);
        assert_eq!(chain.balance(coinbase), BLOCK_REWARD + fees);
        assert_eq!(chain.nonce(sender()), 2);

        let receipts = chain.receipts(hash).unwrap().unwrap();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].cumulative_gas_used, 21_000);
        assert_eq!(receipts[1].cumulative_gas_used, 42_000);
        assert_eq!(block.header.gas_used, 42_000);
        assert!(receipts
            .iter()
            .all(|receipt| receipt.outcome == ReceiptOutcome::Status(true)));
    }

    #[test]
    fn failed_call_reports_status_false() {
        let mut chain = test_chain();
        let mut call = Transaction {
            nonce: 0,
            gas_price: U256::from(GAS_PRICE),
            gas_limit: 50_000,
            to: TxKind::Call(contract()),
            value: ether(1),
            ..Default::default()
        };
        call = call.sign(&secret_key(), Some(CHAIN_ID));
        let block = new_block(&chain, Address::repeat_byte(0xc1), vec![call], vec![]);
        let hash = chain.import_block(&block).unwrap();

        let receipts = chain.receipts(hash).unwrap().unwrap();
        assert_eq!(receipts[0].outcome, ReceiptOutcome::Status(false));
        assert_eq!(receipts[0].cumulative_gas_used, 50_000);
        assert_eq!(chain.balance(contract()), U256::zero());
        assert_eq!(
            chain.balance(sender()),
            ether(100) - U256::from(50_000 * GAS_PRICE)
        );
    }

    #[test]
    fn pre_byzantium_receipts_carry_state_root() {
        let mut chain = Blockchain::from_genesis(&genesis(chain_config(10))).unwrap();
        let block = new_block(
            &chain,
            Address::repeat_byte(0xc1),
            vec![transfer(0, Address::repeat_byte(0xee), ether(1))],
            vec![],
        );
        let hash = chain.import_block(&block).unwrap();
        let receipts = chain.receipts(hash).unwrap().unwrap();
        // Taken before the block reward is paid
        assert!(matches!(
            receipts[0].outcome,
            ReceiptOutcome::StateRoot(root) if root != block.header.state_root
        ));
    }

    #[test]
    fn transactions_root_mismatch_leaves_no_trace() {
        let mut chain = test_chain();
        let genesis_head = chain.canonical_head().unwrap();
        let state_root = chain.state().root_hash();

        let mut block = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        block.header.transactions_root =
            compute_transactions_root(&[transfer(0, Address::repeat_byte(0xee), ether(1))]);

        let result = chain.import_block(&block);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(
                InvalidBlockError::TransactionsRootMismatch { number: 1, .. }
            ))
        ));
        assert_eq!(chain.canonical_head().unwrap(), genesis_head);
        assert_eq!(chain.state().root_hash(), state_root);
        assert!(chain.get_block_header(block.hash()).unwrap().is_none());
    }

    #[test]
    fn unrecoverable_sender_rejects_block() {
        let mut chain = test_chain();
        let mut block = new_block(
            &chain,
            Address::repeat_byte(0xc1),
            vec![transfer(0, Address::repeat_byte(0xee), ether(1))],
            vec![],
        );
        block.body.transactions[0].v = 30;
        block.header.transactions_root = compute_transactions_root(&block.body.transactions);

        let result = chain.import_block(&block);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(
                InvalidBlockError::SenderRecoveryFailed { index: 0, .. }
            ))
        ));
        assert_eq!(chain.canonical_head().unwrap().number, 0);
        assert_eq!(chain.balance(sender()), ether(100));
    }

    #[test]
    fn wrong_state_root_is_rejected() {
        let mut chain = test_chain();
        let mut block = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        block.header.state_root = H256::repeat_byte(0x01);
        let result = chain.import_block(&block);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(
                InvalidBlockError::StateRootMismatch { number: 1, .. }
            ))
        ));
        assert_eq!(chain.balance(Address::repeat_byte(0xc1)), U256::zero());
    }

    #[test]
    fn replayed_nonce_is_rejected() {
        let mut chain = test_chain();
        let tx = transfer(0, Address::repeat_byte(0xee), ether(1));
        let block = new_block(&chain, Address::repeat_byte(0xc1), vec![tx.clone()], vec![]);
        chain.import_block(&block).unwrap();

        let mut replay = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        replay.body.transactions = vec![tx];
        replay.header.transactions_root = compute_transactions_root(&replay.body.transactions);
        let result = chain.import_block(&replay);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(InvalidBlockError::NonceMismatch {
                expected: 1,
                actual: 0,
                ..
            }))
        ));
    }

    #[test]
    fn gas_used_mismatch_is_rejected() {
        let mut chain = test_chain();
        let mut block = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        block.header.gas_used = 21_000;
        let result = chain.import_block(&block);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(
                InvalidBlockError::GasUsedMismatch {
                    expected: 21_000,
                    actual: 0,
                    ..
                }
            ))
        ));
    }

    #[test]
    fn wrong_ommers_hash_is_rejected() {
        let mut chain = test_chain();
        let mut block = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        block.header.ommers_hash = H256::repeat_byte(0x01);
        let result = chain.import_block(&block);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(
                InvalidBlockError::OmmersHashMismatch { number: 1, expected, .. }
            )) if expected == H256::repeat_byte(0x01)
        ));
        assert_eq!(chain.balance(Address::repeat_byte(0xc1)), U256::zero());
    }

    #[test]
    fn wrong_logs_bloom_is_rejected() {
        let mut chain = test_chain();
        let mut block = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        block.header.logs_bloom = Bloom::repeat_byte(0x01);
        let result = chain.import_block(&block);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(
                InvalidBlockError::LogsBloomMismatch { number: 1, actual, .. }
            )) if actual.is_zero()
        ));
        assert_eq!(chain.canonical_head().unwrap().number, 0);
    }

    #[test]
    fn three_uncles_are_rejected() {
        let mut chain = test_chain();
        let blocks = import_empty_blocks(&mut chain, 2);
        let uncles = (0..3)
            .map(|index| BlockHeader {
                parent_hash: blocks[0].hash(),
                number: 2,
                coinbase: Address::from_low_u64_be(0xd000 + index),
                ..blocks[1].header.clone()
            })
            .collect();
        let block = new_block(&chain, Address::repeat_byte(0xc3), vec![], uncles);
        let result = chain.import_block(&block);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(InvalidBlockError::TooManyUncles {
                number: 3,
                expected: 2,
                actual: 3,
            }))
        ));
        assert_eq!(chain.canonical_head().unwrap().hash, blocks[1].hash());
        assert!(chain
            .store()
            .get_ommers(block.header.ommers_hash)
            .unwrap()
            .is_none());
    }

    #[test]
    fn transaction_above_block_gas_limit_is_rejected() {
        let mut chain = test_chain();
        let mut block = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        block.header.gas_limit = 20_000;
        block.body.transactions = vec![transfer(0, Address::repeat_byte(0xee), ether(1))];
        block.header.transactions_root = compute_transactions_root(&block.body.transactions);

        let result = chain.import_block(&block);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(
                InvalidBlockError::TxGasLimitExceeded {
                    number: 1,
                    index: 0,
                    available: 20_000,
                    requested: 21_000,
                }
            ))
        ));
        assert_eq!(chain.balance(sender()), ether(100));
        assert_eq!(chain.nonce(sender()), 0);
    }

    #[test]
    fn header_must_reference_given_parent() {
        let chain = test_chain();
        let block = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        let genesis_header = chain
            .get_block_header(block.header.parent_hash)
            .unwrap()
            .unwrap();
        let other_parent = BlockHeader {
            extra_data: Bytes::from_static(b"other"),
            ..genesis_header
        };

        let mut state = chain.state().clone();
        let mut transaction = chain.store().begin_transaction();
        let result = process_block(
            chain.chain_config(),
            &mut transaction,
            &other_parent,
            &block,
            &mut state,
            chain.interpreter(),
        );
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(
                InvalidBlockError::ParentHashMismatch { number: 1, expected, actual }
            )) if expected == other_parent.compute_block_hash()
                && actual == block.header.parent_hash
        ));
        assert!(transaction.is_empty());
        assert_eq!(state.root_hash(), chain.state().root_hash());
    }

    #[test]
    fn unknown_parent_is_not_found() {
        let mut chain = test_chain();
        let mut block = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        block.header.parent_hash = H256::repeat_byte(0xab);
        assert!(matches!(
            chain.import_block(&block),
            Err(ChainError::ParentNotFound)
        ));
    }

    #[test]
    fn block_number_must_follow_parent() {
        let mut chain = test_chain();
        let mut block = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        block.header.number = 5;
        let result = chain.import_block(&block);
        assert!(matches!(
            result,
            Err(ChainError::InvalidBlock(InvalidBlockError::NumberMismatch {
                expected: 1,
                actual: 5,
            }))
        ));
        assert!(chain.get_block_header(block.hash()).unwrap().is_none());
    }

    #[test]
    fn batch_import_is_all_or_nothing() {
        // Build a valid chain of three blocks on a scratch instance
        let mut builder = test_chain();
        let mut blocks = Vec::new();
        for nonce in 0..3 {
            let block = new_block(
                &builder,
                Address::repeat_byte(0xc1),
                vec![transfer(nonce, Address::repeat_byte(0xee), ether(1))],
                vec![],
            );
            builder.import_block(&block).unwrap();
            blocks.push(block);
        }

        let mut chain = test_chain();
        let mut corrupted = blocks.clone();
        corrupted[2].header.receipts_root = H256::zero();
        assert!(chain.import_blocks(&corrupted).is_err());
        assert_eq!(chain.canonical_head().unwrap().number, 0);
        assert_eq!(chain.balance(sender()), ether(100));
        assert!(chain.store().get_block_header(1).unwrap().is_none());

        let head = chain.import_blocks(&blocks).unwrap();
        assert_eq!(head, Some(blocks[2].hash()));
        assert_eq!(chain.canonical_head().unwrap(), builder.canonical_head().unwrap());
        assert_eq!(chain.state().root_hash(), builder.state().root_hash());
        assert_eq!(chain.store().get_block_header(2).unwrap(), Some(blocks[1].header.clone()));
    }

    #[test]
    fn block_not_extending_head_is_refused() {
        let mut chain = test_chain();
        let first = new_block(&chain, Address::repeat_byte(0xc1), vec![], vec![]);
        let sibling = new_block(&chain, Address::repeat_byte(0xc2), vec![], vec![]);
        chain.import_block(&first).unwrap();
        assert!(matches!(
            chain.import_block(&sibling),
            Err(ChainError::NonCanonicalParent)
        ));
    }

    /// Emits one log per call into a contract and succeeds
    struct LoggingInterpreter;

    impl Interpreter for LoggingInterpreter {
        fn exec_computation(
            &self,
            state: &mut dyn StateStore,
            computation: &mut Computation,
        ) -> Result<bool, EvmError> {
            let target = computation.target().unwrap();
            state.add_balance(target, computation.value);
            computation.add_log(Log {
                address: target,
                topics: vec![H256::from_low_u64_be(computation.value.low_u64())],
                data: Bytes::new(),
            });
            Ok(true)
        }
    }

    #[test]
    fn block_bloom_aggregates_receipt_blooms() {
        let store =
            blockreplay_storage::Store::new(blockreplay_storage::EngineType::InMemory).unwrap();
        let mut chain =
            Blockchain::with_interpreter(&genesis(chain_config(0)), store, LoggingInterpreter)
                .unwrap();
        let block = new_block(
            &chain,
            Address::repeat_byte(0xc1),
            vec![
                transfer(0, contract(), U256::from(1)),
                transfer(1, Address::repeat_byte(0xee), U256::from(2)),
            ],
            vec![],
        );
        let hash = chain.import_block(&block).unwrap();
        let receipts = chain.receipts(hash).unwrap().unwrap();

        let mut expected = Bloom::zero();
        for receipt in receipts.iter().rev() {
            assert!(!receipt.bloom.is_zero());
            expected.accrue_bloom(&receipt.bloom);
        }
        assert_eq!(block.header.logs_bloom, expected);
        assert_ne!(receipts[0].bloom, receipts[1].bloom);
    }
}
