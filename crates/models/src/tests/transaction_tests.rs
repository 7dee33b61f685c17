use anyhow::Result;
use sea_orm::{EntityTrait, TransactionTrait};

use super::setup_test_db;
use crate::{business, customer};

#[tokio::test]
async fn commit_persists_all_rows() -> Result<()> {
    let db = setup_test_db().await?;
    let txn = db.begin().await?;
    let b = business::create(&txn, "Tx Commit", None).await?;
    let c = customer::create(
        &txn,
        b.id,
        customer::NewCustomer { name: "Finn".into(), email: "finn@example.com".into(), ..Default::default() },
    )
    .await?;
    txn.commit().await?;

    assert!(business::Entity::find_by_id(b.id).one(&db).await?.is_some());
    assert!(customer::Entity::find_by_id(c.id).one(&db).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn rollback_discards_partial_writes() -> Result<()> {
    let db = setup_test_db().await?;
    let b = business::create(&db, "Tx Rollback", None).await?;
    let txn = db.begin().await?;
    let c = customer::create(
        &txn,
        b.id,
        customer::NewCustomer { name: "Gus".into(), email: "gus@example.com".into(), ..Default::default() },
    )
    .await?;
    // 第二步失败：同租户重复邮箱
    let dup = customer::create(
        &txn,
        b.id,
        customer::NewCustomer { name: "Gus 2".into(), email: "gus@example.com".into(), ..Default::default() },
    )
    .await;
    assert!(dup.is_err());
    txn.rollback().await?;

    assert!(customer::Entity::find_by_id(c.id).one(&db).await?.is_none());
    Ok(())
}
