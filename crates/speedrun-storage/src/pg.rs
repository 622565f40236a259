use crate::error::StoreError;
use crate::filter::{IntentFilter, Page, Pagination};
use crate::gateway::PersistenceGateway;
use crate::rows::{FulfillmentParams, FulfillmentRow, IntentParams, IntentRow, SettlementParams};
use async_trait::async_trait;
use speedrun_types::common::{address_to_hex, bytes32_to_hex};
use speedrun_types::model::{Fulfillment, Intent, Settlement, UpsertOutcome};
use speedrun_types::{Address, BlockNumber, Bytes32, ChainId, EventKind, U256};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, QueryBuilder};

/// `sqlx`-backed [`PersistenceGateway`] over a Postgres pool, grounded in the
/// same `PgPool`-per-indexer shape the pack's multi-chain indexer uses.
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Closes the pool, waiting for in-flight queries to finish. Part of the
    /// orchestrator's shutdown sequence (§4.I): called only after every
    /// ingestion worker and the API server have stopped.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn inserted(row: &sqlx::postgres::PgRow) -> Result<UpsertOutcome, StoreError> {
        use sqlx::Row;
        let inserted: bool = row.try_get("inserted")?;
        Ok(if inserted { UpsertOutcome::Inserted } else { UpsertOutcome::Updated })
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn upsert_intent(&self, intent: Intent) -> Result<UpsertOutcome, StoreError> {
        let p = IntentParams::from(&intent);
        let row = sqlx::query(
            r#"
            INSERT INTO intents (
                id, source_chain, destination_chain, token, amount, tip, sender, recipient,
                is_call, call_data, status, status_rank, created_at, updated_at,
                timestamp_is_fallback, block_number, tx_hash, target_chain_fallback, is_placeholder
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19)
            ON CONFLICT (id) DO UPDATE SET
                -- A placeholder row (created from a Fulfilled/Settled that
                -- beat its Initiated) gets its identity fields promoted to
                -- the authoritative on-chain Initiated values exactly once;
                -- a row that is already real never has them touched again.
                source_chain = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.source_chain ELSE intents.source_chain END,
                destination_chain = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.destination_chain ELSE intents.destination_chain END,
                token = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.token ELSE intents.token END,
                amount = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.amount ELSE intents.amount END,
                tip = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.tip ELSE intents.tip END,
                sender = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.sender ELSE intents.sender END,
                recipient = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.recipient ELSE intents.recipient END,
                is_call = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.is_call ELSE intents.is_call END,
                call_data = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.call_data ELSE intents.call_data END,
                block_number = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.block_number ELSE intents.block_number END,
                tx_hash = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.tx_hash ELSE intents.tx_hash END,
                target_chain_fallback = CASE WHEN intents.is_placeholder AND NOT EXCLUDED.is_placeholder
                              THEN EXCLUDED.target_chain_fallback ELSE intents.target_chain_fallback END,
                is_placeholder = intents.is_placeholder AND EXCLUDED.is_placeholder,
                status = CASE WHEN EXCLUDED.status_rank >= intents.status_rank
                              THEN EXCLUDED.status ELSE intents.status END,
                status_rank = CASE WHEN EXCLUDED.status_rank >= intents.status_rank
                              THEN EXCLUDED.status_rank ELSE intents.status_rank END,
                updated_at = CASE WHEN EXCLUDED.status_rank >= intents.status_rank
                              THEN EXCLUDED.updated_at ELSE intents.updated_at END,
                timestamp_is_fallback = CASE WHEN EXCLUDED.status_rank >= intents.status_rank
                              THEN EXCLUDED.timestamp_is_fallback ELSE intents.timestamp_is_fallback END
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(p.id)
        .bind(p.source_chain)
        .bind(p.destination_chain)
        .bind(p.token)
        .bind(p.amount)
        .bind(p.tip)
        .bind(p.sender)
        .bind(p.recipient)
        .bind(p.is_call)
        .bind(p.call_data)
        .bind(p.status)
        .bind(p.status_rank)
        .bind(p.created_at)
        .bind(p.updated_at)
        .bind(p.timestamp_is_fallback)
        .bind(p.block_number)
        .bind(p.tx_hash)
        .bind(p.target_chain_fallback)
        .bind(p.is_placeholder)
        .fetch_one(&self.pool)
        .await?;

        Self::inserted(&row)
    }

    async fn upsert_fulfillment(&self, fulfillment: Fulfillment) -> Result<UpsertOutcome, StoreError> {
        let p = FulfillmentParams::from(&fulfillment);
        let row = sqlx::query(
            r#"
            INSERT INTO fulfillments (
                id, intent_id, asset, amount, receiver, is_call, call_data,
                block_number, tx_hash, created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
            ON CONFLICT (tx_hash, intent_id) DO UPDATE SET updated_at = EXCLUDED.updated_at
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(p.id)
        .bind(p.intent_id)
        .bind(p.asset)
        .bind(p.amount)
        .bind(p.receiver)
        .bind(p.is_call)
        .bind(p.call_data)
        .bind(p.block_number)
        .bind(p.tx_hash)
        .bind(p.created_at)
        .bind(p.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::inserted(&row)
    }

    async fn upsert_settlement(&self, settlement: Settlement) -> Result<UpsertOutcome, StoreError> {
        let p = SettlementParams::from(&settlement);
        let row = sqlx::query(
            r#"
            INSERT INTO settlements (
                id, intent_id, asset, amount, actual_amount, receiver, fulfilled,
                fulfiller, paid_tip, is_call, call_data, block_number, tx_hash,
                created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)
            ON CONFLICT (intent_id) DO UPDATE SET updated_at = EXCLUDED.updated_at
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(p.id)
        .bind(p.intent_id)
        .bind(p.asset)
        .bind(p.amount)
        .bind(p.actual_amount)
        .bind(p.receiver)
        .bind(p.fulfilled)
        .bind(p.fulfiller)
        .bind(p.paid_tip)
        .bind(p.is_call)
        .bind(p.call_data)
        .bind(p.block_number)
        .bind(p.tx_hash)
        .bind(p.created_at)
        .bind(p.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::inserted(&row)
    }

    async fn get_intent(&self, id: Bytes32) -> Result<Option<Intent>, StoreError> {
        let row: Option<IntentRow> = sqlx::query_as("SELECT * FROM intents WHERE id = $1")
            .bind(bytes32_to_hex(&id))
            .fetch_optional(&self.pool)
            .await?;
        row.map(IntentRow::into_domain).transpose()
    }

    async fn list_intents(
        &self,
        filter: IntentFilter,
        pagination: Pagination,
    ) -> Result<Page<Intent>, StoreError> {
        let mut count_qb: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM intents WHERE 1=1");
        let mut select_qb: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT * FROM intents WHERE 1=1");

        for qb in [&mut count_qb, &mut select_qb] {
            if let Some(status) = filter.status {
                qb.push(" AND status = ").push_bind(status.as_str().to_string());
            }
            if let Some(source_chain) = filter.source_chain {
                qb.push(" AND source_chain = ").push_bind(source_chain.0 as i64);
            }
            if let Some(destination_chain) = filter.destination_chain {
                qb.push(" AND destination_chain = ").push_bind(destination_chain.0 as i64);
            }
        }

        select_qb
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let total_count: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;
        let rows: Vec<IntentRow> = select_qb.build_query_as().fetch_all(&self.pool).await?;
        let intents = rows.into_iter().map(IntentRow::into_domain).collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(intents, pagination, total_count.max(0) as u64))
    }

    async fn list_intents_by_sender(
        &self,
        sender: Address,
        pagination: Pagination,
    ) -> Result<Page<Intent>, StoreError> {
        self.list_by_address_column("sender", sender, pagination).await
    }

    async fn list_intents_by_recipient(
        &self,
        recipient: Address,
        pagination: Pagination,
    ) -> Result<Page<Intent>, StoreError> {
        self.list_by_address_column("recipient", recipient, pagination).await
    }

    async fn get_fulfillment(&self, id: Bytes32) -> Result<Option<Fulfillment>, StoreError> {
        let row: Option<FulfillmentRow> = sqlx::query_as("SELECT * FROM fulfillments WHERE id = $1")
            .bind(bytes32_to_hex(&id))
            .fetch_optional(&self.pool)
            .await?;
        row.map(FulfillmentRow::into_domain).transpose()
    }

    async fn list_fulfillments(&self, pagination: Pagination) -> Result<Page<Fulfillment>, StoreError> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fulfillments")
            .fetch_one(&self.pool)
            .await?;
        let rows: Vec<FulfillmentRow> = sqlx::query_as(
            "SELECT * FROM fulfillments ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;
        let fulfillments = rows.into_iter().map(FulfillmentRow::into_domain).collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(fulfillments, pagination, total_count.max(0) as u64))
    }

    async fn get_cursor(&self, chain_id: ChainId, kind: EventKind) -> Result<Option<BlockNumber>, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT last_block FROM cursors WHERE chain_id = $1 AND event_kind = $2",
        )
        .bind(chain_id.0 as i64)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(block,)| block as u64))
    }

    async fn set_cursor(&self, chain_id: ChainId, kind: EventKind, block: BlockNumber) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO cursors (chain_id, event_kind, last_block, updated_at)
            VALUES ($1, $2, $3, extract(epoch from now())::bigint)
            ON CONFLICT (chain_id, event_kind) DO UPDATE SET
                last_block = GREATEST(cursors.last_block, EXCLUDED.last_block),
                updated_at = CASE WHEN EXCLUDED.last_block > cursors.last_block
                             THEN EXCLUDED.updated_at ELSE cursors.updated_at END
            "#,
        )
        .bind(chain_id.0 as i64)
        .bind(kind.as_str())
        .bind(block as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn sum_fulfilled_amount(&self, intent_id: Bytes32) -> Result<U256, StoreError> {
        let amounts: Vec<(String,)> =
            sqlx::query_as("SELECT amount FROM fulfillments WHERE intent_id = $1")
                .bind(bytes32_to_hex(&intent_id))
                .fetch_all(&self.pool)
                .await?;

        let mut total = U256::ZERO;
        for (amount,) in amounts {
            let parsed = U256::from_str_radix(&amount, 10)
                .map_err(|e| StoreError::Integrity(format!("bad amount {amount:?}: {e}")))?;
            total = total.checked_add(parsed).ok_or_else(|| {
                StoreError::Integrity(format!("fulfilled sum overflow for intent {intent_id}"))
            })?;
        }
        Ok(total)
    }
}

impl PgGateway {
    async fn list_by_address_column(
        &self,
        column: &str,
        address: Address,
        pagination: Pagination,
    ) -> Result<Page<Intent>, StoreError> {
        let hex = address_to_hex(&address);
        let count_sql = format!("SELECT COUNT(*) FROM intents WHERE {column} = $1");
        let select_sql =
            format!("SELECT * FROM intents WHERE {column} = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3");

        let total_count: i64 = sqlx::query_scalar(&count_sql).bind(&hex).fetch_one(&self.pool).await?;
        let rows: Vec<IntentRow> = sqlx::query_as(&select_sql)
            .bind(&hex)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;
        let intents = rows.into_iter().map(IntentRow::into_domain).collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(intents, pagination, total_count.max(0) as u64))
    }
}
