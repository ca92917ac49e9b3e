use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            FantasyPlayerEntity, FantasyTeamEntity, GameEntity, PickEntity, PickFilter,
            ProfileEntity, RunningBackEntity, SettlementReport, WeekSettlement,
        },
        pickem_store::PickemStore,
        storage::StorageResult,
    },
    state::week::{WeekKey, WeekStatus},
};

use super::{
    config::PostgrestConfig,
    error::{PostgrestDaoError, PostgrestResult},
    rows::{
        FANTASY_PLAYERS, FANTASY_TEAMS, GAMES, IncrementArgs, PICKS, PROFILES, RUNNING_BACKS,
        SettleArgs, WEEKS, WeekRow, eq,
    },
};

type Query = Vec<(&'static str, String)>;

/// [`PickemStore`] backed by a PostgREST HTTP API.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: Arc<str>,
    api_key: Arc<str>,
    schema: Option<Arc<str>>,
}

impl PostgrestStore {
    /// Build the client and verify the endpoint answers.
    pub async fn connect(config: PostgrestConfig) -> PostgrestResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| PostgrestDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            api_key: Arc::from(config.api_key),
            schema: config.schema.map(Arc::from),
        };

        store.ping().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method, url)
            .header("apikey", self.api_key.as_ref())
            .bearer_auth(self.api_key.as_ref());
        if let Some(schema) = &self.schema {
            builder = builder
                .header("Accept-Profile", schema.as_ref())
                .header("Content-Profile", schema.as_ref());
        }
        builder
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> PostgrestResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|source| PostgrestDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(PostgrestDaoError::RequestStatus {
                path: path.to_string(),
                status,
                body,
            })
        }
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> PostgrestResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|source| PostgrestDaoError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    async fn ping(&self) -> PostgrestResult<()> {
        self.send("", self.request(Method::GET, "")).await.map(|_| ())
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: Query) -> PostgrestResult<Vec<T>> {
        let builder = self
            .request(Method::GET, table)
            .query(&[("select", "*")])
            .query(&query);
        let response = self.send(table, builder).await?;
        Self::decode(table, response).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: Query,
    ) -> PostgrestResult<Option<T>> {
        let mut rows = self.select::<T>(table, query).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> PostgrestResult<()> {
        let builder = self
            .request(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(row);
        self.send(table, builder).await.map(|_| ())
    }

    async fn upsert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        on_conflict: &str,
        row: &T,
    ) -> PostgrestResult<()> {
        let builder = self
            .request(Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row);
        self.send(table, builder).await.map(|_| ())
    }

    /// PATCH the filtered rows; fails when nothing matched.
    async fn patch(
        &self,
        table: &str,
        query: Query,
        body: serde_json::Value,
    ) -> PostgrestResult<()> {
        let builder = self
            .request(Method::PATCH, table)
            .query(&query)
            .header("Prefer", "return=representation")
            .json(&body);
        let response = self.send(table, builder).await?;
        let rows: Vec<serde_json::Value> = Self::decode(table, response).await?;
        if rows.is_empty() {
            Err(PostgrestDaoError::NoRowsAffected {
                path: table.to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn delete<T: DeserializeOwned>(&self, table: &str, query: Query) -> PostgrestResult<Vec<T>> {
        let builder = self
            .request(Method::DELETE, table)
            .query(&query)
            .header("Prefer", "return=representation");
        let response = self.send(table, builder).await?;
        Self::decode(table, response).await
    }

    async fn rpc<A: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        function: &str,
        args: &A,
    ) -> PostgrestResult<T> {
        let path = format!("rpc/{function}");
        let builder = self.request(Method::POST, &path).json(args);
        let response = self.send(&path, builder).await?;
        Self::decode(&path, response).await
    }
}

fn week_query(key: WeekKey) -> Query {
    vec![("season", eq(key.season)), ("week", eq(key.week))]
}

fn pick_query(filter: &PickFilter) -> Query {
    let mut query = Query::new();
    if let Some(user_id) = filter.user_id {
        query.push(("user_id", eq(user_id)));
    }
    if let Some(season) = filter.season {
        query.push(("season", eq(season)));
    }
    if let Some(week) = filter.week {
        query.push(("week", eq(week)));
    }
    if let Some(player_id) = &filter.player_id {
        query.push(("player_id", eq(player_id)));
    }
    if let Some(finalized) = filter.is_finalized {
        query.push(("is_finalized", eq(finalized)));
    }
    query
}

impl PickemStore for PostgrestStore {
    fn find_profile(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ProfileEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .select_one(PROFILES, vec![("id", eq(id))])
                .await?)
        })
    }

    fn list_profiles(&self) -> BoxFuture<'static, StorageResult<Vec<ProfileEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.select(PROFILES, Query::new()).await?) })
    }

    fn save_profile(&self, profile: ProfileEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.upsert(PROFILES, "id", &profile).await?) })
    }

    fn increment_total_yards(
        &self,
        user_id: Uuid,
        delta: i64,
    ) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .rpc("increment_total_yards", &IncrementArgs { user_id, delta })
                .await?)
        })
    }

    fn list_picks(&self, filter: PickFilter) -> BoxFuture<'static, StorageResult<Vec<PickEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.select(PICKS, pick_query(&filter)).await?) })
    }

    fn insert_pick(&self, pick: PickEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.insert(PICKS, &pick).await?) })
    }

    fn update_pick(&self, pick: PickEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let body = serde_json::to_value(&pick).map_err(|err| {
                crate::dao::storage::StorageError::unavailable(
                    format!("failed to encode pick {}", pick.id),
                    err,
                )
            })?;
            Ok(store.patch(PICKS, vec![("id", eq(pick.id))], body).await?)
        })
    }

    fn delete_picks(
        &self,
        user_id: Uuid,
        season: Option<u16>,
        week: Option<u8>,
    ) -> BoxFuture<'static, StorageResult<Vec<PickEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = PickFilter {
                user_id: Some(user_id),
                season,
                week,
                ..PickFilter::default()
            };
            Ok(store.delete(PICKS, pick_query(&filter)).await?)
        })
    }

    fn list_running_backs(
        &self,
        key: WeekKey,
    ) -> BoxFuture<'static, StorageResult<Vec<RunningBackEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.select(RUNNING_BACKS, week_query(key)).await?) })
    }

    fn find_running_back(
        &self,
        key: WeekKey,
        player_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<RunningBackEntity>>> {
        let store = self.clone();
        let mut query = week_query(key);
        query.push(("player_id", eq(player_id)));
        Box::pin(async move { Ok(store.select_one(RUNNING_BACKS, query).await?) })
    }

    fn save_running_back(
        &self,
        running_back: RunningBackEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .upsert(RUNNING_BACKS, "season,week,player_id", &running_back)
                .await?)
        })
    }

    fn delete_running_back(
        &self,
        key: WeekKey,
        player_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<RunningBackEntity>>> {
        let store = self.clone();
        let mut query = week_query(key);
        query.push(("player_id", eq(player_id)));
        Box::pin(async move {
            let mut removed: Vec<RunningBackEntity> = store.delete(RUNNING_BACKS, query).await?;
            Ok(removed.pop())
        })
    }

    fn set_player_lock(
        &self,
        key: WeekKey,
        player_id: &str,
        locked: bool,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let mut query = week_query(key);
        query.push(("player_id", eq(player_id)));
        Box::pin(async move {
            Ok(store
                .patch(RUNNING_BACKS, query, json!({ "is_locked": locked }))
                .await?)
        })
    }

    fn list_games(&self, key: WeekKey) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.select(GAMES, week_query(key)).await?) })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.upsert(GAMES, "game_id", &game).await?) })
    }

    fn week_status(&self, key: WeekKey) -> BoxFuture<'static, StorageResult<WeekStatus>> {
        let store = self.clone();
        Box::pin(async move {
            let row: Option<WeekRow> = store.select_one(WEEKS, week_query(key)).await?;
            Ok(row.map_or(WeekStatus::Active, |row| row.status(key)))
        })
    }

    fn settle_week(
        &self,
        settlement: WeekSettlement,
    ) -> BoxFuture<'static, StorageResult<SettlementReport>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .rpc(
                    "settle_week",
                    &SettleArgs {
                        settlement: &settlement,
                    },
                )
                .await?)
        })
    }

    fn list_fantasy_players(&self) -> BoxFuture<'static, StorageResult<Vec<FantasyPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.select(FANTASY_PLAYERS, Query::new()).await?) })
    }

    fn find_fantasy_player(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FantasyPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .select_one(FANTASY_PLAYERS, vec![("id", eq(id))])
                .await?)
        })
    }

    fn save_fantasy_player(
        &self,
        player: FantasyPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.upsert(FANTASY_PLAYERS, "id", &player).await?) })
    }

    fn list_fantasy_teams(&self) -> BoxFuture<'static, StorageResult<Vec<FantasyTeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.select(FANTASY_TEAMS, Query::new()).await?) })
    }

    fn find_fantasy_team(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FantasyTeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .select_one(FANTASY_TEAMS, vec![("id", eq(id))])
                .await?)
        })
    }

    fn save_fantasy_team(&self, team: FantasyTeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        // team_name carries a unique index; a clash surfaces as 409
        Box::pin(async move { Ok(store.upsert(FANTASY_TEAMS, "id", &team).await?) })
    }

    fn delete_fantasy_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let removed: Vec<serde_json::Value> =
                store.delete(FANTASY_TEAMS, vec![("id", eq(id))]).await?;
            Ok(!removed.is_empty())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.ping().await?) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.ping().await?) })
    }
}
