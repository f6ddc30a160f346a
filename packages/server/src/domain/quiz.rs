//! Quiz エンティティ

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ValueObjectError;

/// Quiz ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuizId(Uuid);

impl QuizId {
    /// 新しいランダムな ID を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValueObjectError::InvalidId(value.to_string()))
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Quiz の公開状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizStatus {
    Draft,
    Active,
    Closed,
}

impl QuizStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizStatus::Draft => "draft",
            QuizStatus::Active => "active",
            QuizStatus::Closed => "closed",
        }
    }
}

impl FromStr for QuizStatus {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(QuizStatus::Draft),
            "active" => Ok(QuizStatus::Active),
            "closed" => Ok(QuizStatus::Closed),
            other => Err(ValueObjectError::UnknownStatus(other.to_string())),
        }
    }
}

/// Quiz エンティティ
///
/// ## 不変条件
///
/// - `status == Closed` ならば `is_active == false`
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    pub close_date: DateTime<Utc>,
    pub status: QuizStatus,
    pub is_active: bool,
}

impl Quiz {
    /// 公開中の Quiz を作成
    pub fn new(id: QuizId, title: impl Into<String>, close_date: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            close_date,
            status: QuizStatus::Active,
            is_active: true,
        }
    }

    /// 状態を指定して作成（`Closed` の場合は `is_active` を強制的に false にする）
    pub fn with_status(mut self, status: QuizStatus, is_active: bool) -> Self {
        self.status = status;
        self.is_active = is_active && status != QuizStatus::Closed;
        self
    }

    /// 締め切りを過ぎたのにまだ開いている（自動クローズの対象）か
    pub fn is_expired_open(&self, now: DateTime<Utc>) -> bool {
        self.close_date <= now && self.is_open()
    }

    /// 自動クローズ前の状態か（`active` / `draft` かつ `is_active`）
    pub fn is_open(&self) -> bool {
        matches!(self.status, QuizStatus::Active | QuizStatus::Draft) && self.is_active
    }

    /// Quiz を締め切る
    pub fn close(&mut self) {
        self.status = QuizStatus::Closed;
        self.is_active = false;
    }
}
