use croupier_types::{
    casino::{Account, Loan, Pool, PoolKind, Settings},
    Key, Value,
};
use std::future::Future;

pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Option<Value>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = ()>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = ()>;

    /// Every stored account, ordered by id.
    fn accounts(&self) -> impl Future<Output = Vec<Account>>;

    /// Every stored loan, ordered by id.
    fn loans(&self) -> impl Future<Output = Vec<Loan>>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> impl Future<Output = ()> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await,
                    Status::Delete => self.delete(&key).await,
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Status {
    Update(Value),
    Delete,
}

pub async fn load_account<S: State>(state: &S, id: &str) -> Option<Account> {
    match state.get(&Key::Account(id.to_string())).await {
        Some(Value::Account(account)) => Some(account),
        _ => None,
    }
}

pub async fn load_settings<S: State>(state: &S) -> Settings {
    match state.get(&Key::Settings).await {
        Some(Value::Settings(settings)) => settings,
        _ => Settings::default(),
    }
}

pub async fn load_pool<S: State>(state: &S, kind: PoolKind) -> Pool {
    match state.get(&Key::Pool(kind)).await {
        Some(Value::Pool(pool)) => pool,
        _ => kind.genesis(),
    }
}
