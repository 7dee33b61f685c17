//! 面向租户的业务服务：校验输入、执行查询、记录审计并广播变更。

pub mod audit_service;
pub mod business_service;
pub mod customer_service;
pub mod catalog_service;
pub mod booking_service;
pub mod invoice_service;
pub mod refund_service;
pub mod communication_service;
pub mod tracking_service;
pub mod apikey_service;
pub mod admin_service;

use common::pagination::Pagination;
use common::types::PageInfo;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;

use crate::errors::ServiceError;

/// 分页列表结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

pub(crate) async fn fetch_page<C, E>(db: &C, select: Select<E>, opts: Pagination) -> Result<Page<E::Model>, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync,
{
    let (page_idx, per_page) = opts.normalize();
    let paginator = select.paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page_idx).await?;
    Ok(Page {
        items,
        page_info: PageInfo { page: page_idx as u32 + 1, per_page: per_page as u32, total },
    })
}

/// 去除首尾空白，空串视为缺失
pub(crate) fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub(crate) fn require(v: Option<String>, field: &str) -> Result<String, ServiceError> {
    non_empty(v).ok_or_else(|| ServiceError::required(field))
}
