use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{Money, OrderStatus};
use crate::domain::port::{OrderRepository, SalesRank};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;

/// 日別の売上
#[derive(Debug, Clone, PartialEq)]
pub struct TurnoverReport {
    pub dates: Vec<NaiveDate>,
    pub turnovers: Vec<Money>,
}

/// 日別の注文件数と完了率
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReport {
    pub dates: Vec<NaiveDate>,
    pub order_counts: Vec<u64>,
    pub valid_order_counts: Vec<u64>,
    pub total_order_count: u64,
    pub valid_order_count: u64,
    /// 完了した注文の割合（注文がなければ0）
    pub order_completion_rate: f64,
}

/// 売上・注文の集計サービス
/// 日付はUTCの暦日で区切り、集計対象は完了した注文
pub struct ReportService {
    order_repository: Arc<dyn OrderRepository>,
}

impl ReportService {
    /// 一度に集計できる最大日数
    pub const MAX_DAYS: i64 = 366;
    /// 販売ランキングの件数
    pub const TOP_SALES_LIMIT: u32 = 10;

    pub fn new(order_repository: Arc<dyn OrderRepository>) -> Self {
        Self { order_repository }
    }

    /// 期間内の日別売上（完了した注文の金額合計）
    pub async fn turnover(
        &self,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<TurnoverReport, ApplicationError> {
        let dates = Self::dates(begin, end)?;
        let mut turnovers = Vec::with_capacity(dates.len());
        for day in &dates {
            let (from, to) = day_bounds(*day);
            turnovers.push(
                self.order_repository
                    .sum_amount_between(from, to, OrderStatus::Completed)
                    .await?,
            );
        }
        Ok(TurnoverReport { dates, turnovers })
    }

    /// 期間内の日別注文件数と有効（完了）注文件数
    pub async fn orders(
        &self,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<OrderReport, ApplicationError> {
        let dates = Self::dates(begin, end)?;
        let mut order_counts = Vec::with_capacity(dates.len());
        let mut valid_order_counts = Vec::with_capacity(dates.len());
        for day in &dates {
            let (from, to) = day_bounds(*day);
            order_counts.push(self.order_repository.count_between(from, to, None).await?);
            valid_order_counts.push(
                self.order_repository
                    .count_between(from, to, Some(OrderStatus::Completed))
                    .await?,
            );
        }

        let total_order_count: u64 = order_counts.iter().sum();
        let valid_order_count: u64 = valid_order_counts.iter().sum();
        let order_completion_rate = if total_order_count == 0 {
            0.0
        } else {
            valid_order_count as f64 / total_order_count as f64
        };

        Ok(OrderReport {
            dates,
            order_counts,
            valid_order_counts,
            total_order_count,
            valid_order_count,
            order_completion_rate,
        })
    }

    /// 期間内の販売数量上位10商品
    pub async fn top10(
        &self,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SalesRank>, ApplicationError> {
        Self::dates(begin, end)?;
        let (from, _) = day_bounds(begin);
        let (_, to) = day_bounds(end);
        self.order_repository
            .top_sales(from, to, Self::TOP_SALES_LIMIT)
            .await
            .map_err(ApplicationError::from)
    }

    /// 開始日から終了日までの日付（両端を含む）
    fn dates(begin: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, DomainError> {
        if begin > end {
            return Err(DomainError::Validation(
                "開始日は終了日以前を指定してください".to_string(),
            ));
        }
        if (end - begin).num_days() >= Self::MAX_DAYS {
            return Err(DomainError::Validation(format!(
                "集計期間は{}日以内で指定してください",
                Self::MAX_DAYS
            )));
        }
        Ok(begin.iter_days().take_while(|day| *day <= end).collect())
    }
}

/// 暦日の開始時刻と翌日の開始時刻
fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
    (start, start + Duration::days(1))
}
