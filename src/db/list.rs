//! Generic repository over a JSON list stored under one key.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use super::KvStore;
use crate::errors::AppError;

/// How a record leaves its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// Filter the record out of the list.
    Remove,
    /// Keep the record and flip it inactive via [`Record::deactivate`].
    Deactivate,
}

/// Whether an upsert inserted a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// An entity persisted as one element of a JSON list.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Store key holding the list.
    const KEY: &'static str;
    const DELETION: Deletion = Deletion::Remove;
    /// Name used in "not found" messages.
    const LABEL: &'static str;

    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;

    fn deactivate(&mut self, _now: DateTime<Utc>) {}
}

pub struct ListRepository<T> {
    kv: KvStore,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ListRepository<T> {
    fn clone(&self) -> Self {
        Self {
            kv: self.kv.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> ListRepository<T> {
    pub fn new(kv: KvStore) -> Self {
        Self {
            kv,
            _record: PhantomData,
        }
    }

    /// The whole list in stored order.
    pub async fn all(&self) -> Result<Vec<T>, AppError> {
        Ok(self.kv.get::<Vec<T>>(T::KEY).await?.unwrap_or_default())
    }

    /// Records matching `filter`, newest first.
    pub async fn list<F>(&self, filter: F) -> Result<Vec<T>, AppError>
    where
        F: Fn(&T) -> bool,
    {
        let mut records: Vec<T> = self.all().await?.into_iter().filter(|r| filter(r)).collect();
        records.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
        Ok(records)
    }

    pub async fn find(&self, id: &str) -> Result<Option<T>, AppError> {
        Ok(self.all().await?.into_iter().find(|r| r.id() == id))
    }

    pub async fn get(&self, id: &str) -> Result<T, AppError> {
        self.find(id).await?.ok_or_else(|| not_found::<T>(id))
    }

    /// Read-modify-write the whole list.
    pub async fn mutate<R, F>(&self, apply: F) -> Result<R, AppError>
    where
        R: Send,
        F: FnMut(&mut Vec<T>) -> Result<R, AppError> + Send,
    {
        self.kv.update::<Vec<T>, R, F>(T::KEY, apply).await
    }

    /// Replace the record with `id` in place, or append it when absent.
    ///
    /// `build` receives the current record (if any) and the rest of the list
    /// so callers can enforce cross-record rules under the same write.
    pub async fn upsert_with<F>(&self, id: &str, mut build: F) -> Result<(T, Upsert), AppError>
    where
        F: FnMut(Option<&T>, &[T]) -> Result<T, AppError> + Send,
    {
        self.mutate(|records| match records.iter().position(|r| r.id() == id) {
            Some(index) => {
                let record = build(Some(&records[index]), &records[..])?;
                records[index] = record.clone();
                Ok((record, Upsert::Updated))
            }
            None => {
                let record = build(None, &records[..])?;
                records.push(record.clone());
                Ok((record, Upsert::Created))
            }
        })
        .await
    }

    /// Apply a change to an existing record.
    pub async fn modify<F>(&self, id: &str, mut change: F) -> Result<T, AppError>
    where
        F: FnMut(&mut T) -> Result<(), AppError> + Send,
    {
        self.mutate(|records| {
            let record = records
                .iter_mut()
                .find(|r| r.id() == id)
                .ok_or_else(|| not_found::<T>(id))?;
            change(record)?;
            Ok(record.clone())
        })
        .await
    }

    /// Delete according to [`Record::DELETION`].
    pub async fn delete(&self, id: &str) -> Result<T, AppError> {
        self.delete_checked(id, |_, _| Ok(())).await
    }

    /// Delete after `check` approves the record against the current list.
    pub async fn delete_checked<F>(&self, id: &str, check: F) -> Result<T, AppError>
    where
        F: Fn(&T, &[T]) -> Result<(), AppError> + Send,
    {
        self.mutate(move |records| {
            let index = records
                .iter()
                .position(|r| r.id() == id)
                .ok_or_else(|| not_found::<T>(id))?;
            check(&records[index], &records[..])?;

            match T::DELETION {
                Deletion::Remove => Ok(records.remove(index)),
                Deletion::Deactivate => {
                    records[index].deactivate(Utc::now());
                    Ok(records[index].clone())
                }
            }
        })
        .await
    }
}

fn not_found<T: Record>(id: &str) -> AppError {
    AppError::NotFound(format!("{} {} não encontrado", T::LABEL, id))
}

/// Fresh record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
