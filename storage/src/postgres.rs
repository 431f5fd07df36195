//! [`WalletStore`] over PostgreSQL.

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool, Row,
};
use tracing::debug;

use fastsync_types::{AccountInfo, BlockHash, HeightInfo, WalletEntry};

use crate::{
    error::StoreError,
    store::WalletStore,
    types::{BlockEntry, OutputHeight, PreparsedBlock, PreparsedTx, SerializedTx, TaggedBlock},
};

/// Connection settings for the chain/wallet database.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// The production store: a connection pool to the database the
/// indexer writes into.
#[derive(Debug, Clone)]
pub struct PgWalletStore {
    pool: PgPool,
}

impl PgWalletStore {
    /// Connect to the database described by `config`.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool, e.g. one pointing at a test database.
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletStore for PgWalletStore {
    async fn chain_intersection(&self, chain: &[BlockHash]) -> Result<HeightInfo, StoreError> {
        let hashes: Vec<String> = chain.iter().map(hex::encode).collect();

        let row = sqlx::query(
            "SELECT height, hash FROM blocks
             WHERE hash = ANY($1)
             ORDER BY height DESC
             LIMIT 1",
        )
        .bind(&hashes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::ChainDisjoint)?;

        Ok(HeightInfo {
            height: read_height(&row, "height")?,
            hash: parse_hash(row.try_get("hash")?)?,
        })
    }

    async fn top_block_height(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT height FROM blocks ORDER BY height DESC LIMIT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::on_missing_row(e, StoreError::MissingBlock(0)))?;

        read_height(&row, "height")
    }

    async fn block_entry(&self, height: u64) -> Result<BlockEntry, StoreError> {
        let row = sqlx::query(
            "SELECT height, hash, header, timestamp FROM blocks WHERE height = $1",
        )
        .bind(height as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::on_missing_row(e, StoreError::MissingBlock(height)))?;

        Ok(BlockEntry {
            height: read_height(&row, "height")?,
            hash: parse_hash(row.try_get("hash")?)?,
            header: row.try_get("header")?,
            timestamp: row.try_get::<i64, _>("timestamp")? as u64,
        })
    }

    async fn blocks_above(
        &self,
        start_height: u64,
        max_count: usize,
    ) -> Result<Vec<PreparsedBlock>, StoreError> {
        let rows = sqlx::query(
            "SELECT b.height AS height, b.hash AS block_hash, b.header AS header,
                    b.timestamp AS timestamp, t.hash AS tx_hash, t.blob AS tx_blob,
                    t.output_keys AS output_keys, t.output_indices AS output_indices,
                    t.used_inputs AS used_inputs
             FROM transactions t
             JOIN blocks b ON t.block_height = b.height
             WHERE b.height >= $1 AND b.height < $2
             ORDER BY b.height, t.index_in_block",
        )
        .bind(start_height as i64)
        .bind((start_height + max_count as u64) as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut blocks: Vec<PreparsedBlock> = Vec::with_capacity(max_count);
        for row in rows {
            let height = read_height(&row, "height")?;

            if blocks.last().is_none_or(|b| b.entry.height != height) {
                blocks.push(PreparsedBlock {
                    entry: BlockEntry {
                        height,
                        hash: parse_hash(row.try_get("block_hash")?)?,
                        header: row.try_get("header")?,
                        timestamp: row.try_get::<i64, _>("timestamp")? as u64,
                    },
                    txs: Vec::new(),
                });
            }

            let output_keys: Vec<String> = row.try_get("output_keys")?;
            let tx = PreparsedTx {
                hash: parse_hash(row.try_get("tx_hash")?)?,
                blob: row.try_get("tx_blob")?,
                output_keys: output_keys
                    .into_iter()
                    .map(parse_hash)
                    .collect::<Result<_, _>>()?,
                output_indices: read_index_array(&row, "output_indices")?,
                used_inputs: read_index_array(&row, "used_inputs")?,
            };

            blocks.last_mut().expect("pushed above").txs.push(tx);
        }

        Ok(blocks)
    }

    async fn wallet_blocks(
        &self,
        wallet_id: i32,
        start_height: u64,
        max_count: usize,
    ) -> Result<Vec<TaggedBlock>, StoreError> {
        let rows = sqlx::query(
            "SELECT wb.wallet_id AS tag, b.height AS height, b.hash AS block_hash,
                    b.header AS header, b.timestamp AS timestamp,
                    t.hash AS tx_hash, t.blob AS tx_blob, t.output_indices AS output_indices
             FROM blocks b
             LEFT JOIN transactions t ON t.block_height = b.height
             LEFT JOIN wallets_blocks wb ON wb.block_id = b.id AND wb.wallet_id = $3
             WHERE b.height >= $1 AND b.height < $2
             ORDER BY b.height, t.index_in_block",
        )
        .bind(start_height as i64)
        .bind((start_height + max_count as u64) as i64)
        .bind(wallet_id)
        .fetch_all(&self.pool)
        .await?;

        let mut blocks: Vec<TaggedBlock> = Vec::with_capacity(max_count);
        for row in rows {
            let height = read_height(&row, "height")?;
            let relevant = row.try_get::<Option<i32>, _>("tag")?.is_some();

            if blocks.last().is_none_or(|b| b.entry.height != height) {
                blocks.push(TaggedBlock {
                    entry: BlockEntry {
                        height,
                        hash: parse_hash(row.try_get("block_hash")?)?,
                        header: row.try_get("header")?,
                        timestamp: row.try_get::<i64, _>("timestamp")? as u64,
                    },
                    relevant,
                    txs: Vec::new(),
                });
            }

            if !relevant {
                continue;
            }

            let Some(tx_hash) = row.try_get::<Option<String>, _>("tx_hash")? else {
                continue;
            };

            let tx = SerializedTx {
                hash: parse_hash(tx_hash)?,
                blob: row.try_get("tx_blob")?,
                output_indices: read_index_array(&row, "output_indices")?,
            };

            blocks.last_mut().expect("pushed above").txs.push(tx);
        }

        Ok(blocks)
    }

    async fn wallet_outputs(&self, wallet_id: i32) -> Result<Vec<OutputHeight>, StoreError> {
        let rows =
            sqlx::query("SELECT output, block_height FROM wallets_outputs WHERE wallet_id = $1")
                .bind(wallet_id)
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|row| {
                Ok(OutputHeight {
                    output: row.try_get::<i64, _>("output")? as u64,
                    height: read_height(row, "block_height")?,
                })
            })
            .collect()
    }

    async fn save_wallet_blocks(
        &self,
        wallet_id: i32,
        blocks: &[BlockHash],
        outputs: &[OutputHeight],
    ) -> Result<(), StoreError> {
        let hashes: Vec<String> = blocks.iter().map(hex::encode).collect();

        let mut tx = self.pool.begin().await?;

        let tagged = sqlx::query(
            "INSERT INTO wallets_blocks (wallet_id, block_id)
             SELECT $1, id FROM blocks WHERE hash = ANY($2)
             ON CONFLICT DO NOTHING",
        )
        .bind(wallet_id)
        .bind(&hashes)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        for output in outputs {
            sqlx::query(
                "INSERT INTO wallets_outputs (wallet_id, output, block_height)
                 VALUES ($1, $2, $3)
                 ON CONFLICT DO NOTHING",
            )
            .bind(wallet_id)
            .bind(output.output as i64)
            .bind(output.height as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            wallet_id,
            blocks = tagged,
            outputs = outputs.len(),
            "saved wallet blocks"
        );
        Ok(())
    }

    async fn save_wallet_progress(
        &self,
        wallet_id: i32,
        hash: BlockHash,
    ) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "WITH last_block AS (SELECT id FROM blocks WHERE hash = $1)
             UPDATE wallets
             SET last_checked_block_id = last_block.id
             FROM last_block
             WHERE wallets.id = $2",
        )
        .bind(hex::encode(hash))
        .bind(wallet_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        // Zero rows means the block vanished under us, most likely a
        // reorganization between the scan and this write.
        if updated == 0 {
            return Err(StoreError::MissingBlock(0));
        }

        Ok(())
    }

    async fn top_scanned_height(&self, wallet_id: i32) -> Result<HeightInfo, StoreError> {
        let row = sqlx::query(
            "SELECT b.height AS height, b.hash AS hash
             FROM wallets w
             JOIN blocks b ON w.last_checked_block_id = b.id
             WHERE w.id = $1",
        )
        .bind(wallet_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(HeightInfo {
            height: read_height(&row, "height")?,
            hash: parse_hash(row.try_get("hash")?)?,
        })
    }

    async fn get_or_create_wallet(&self, account: AccountInfo) -> Result<WalletEntry, StoreError> {
        let view = hex::encode(account.keys.view_secret);
        let spend = hex::encode(account.keys.spend_public);

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query(
            "SELECT w.id AS id, b.height AS height
             FROM wallets w
             JOIN blocks b ON w.last_checked_block_id = b.id
             WHERE w.secret_view_key = $1 AND w.public_spend_key = $2",
        )
        .bind(&view)
        .bind(&spend)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = existing {
            tx.commit().await?;

            return Ok(WalletEntry {
                id: row.try_get("id")?,
                keys: account.keys,
                scanned_height: read_height(&row, "height")?,
            });
        }

        let row = sqlx::query(
            "INSERT INTO wallets (secret_view_key, public_spend_key, created_at, last_checked_block_id)
             SELECT $1, $2, $3, id FROM blocks WHERE height = $3 LIMIT 1
             RETURNING id",
        )
        .bind(&view)
        .bind(&spend)
        .bind(account.created_at as i64)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::on_missing_row(e, StoreError::MissingBlock(account.created_at)))?;

        let id = row.try_get("id")?;
        tx.commit().await?;

        debug!(id, created_at = account.created_at, "created wallet");

        Ok(WalletEntry {
            id,
            keys: account.keys,
            scanned_height: account.created_at,
        })
    }
}

fn parse_hash(hex_str: String) -> Result<BlockHash, StoreError> {
    let mut hash = BlockHash::default();
    hex::decode_to_slice(&hex_str, &mut hash)
        .map_err(|_| StoreError::CorruptRow(format!("bad hash hex: {hex_str:?}")))?;
    Ok(hash)
}

fn read_height(row: &sqlx::postgres::PgRow, column: &str) -> Result<u64, StoreError> {
    Ok(row.try_get::<i64, _>(column)? as u64)
}

fn read_index_array(row: &sqlx::postgres::PgRow, column: &str) -> Result<Vec<u64>, StoreError> {
    let raw: Vec<i64> = row.try_get(column)?;
    Ok(raw.into_iter().map(|i| i as u64).collect())
}
