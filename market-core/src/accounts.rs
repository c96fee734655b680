//! Account ledger: one balance record per organization
//!
//! Accounts live in the public partition under the bare org identifier.
//! They are created idempotently, credited here, debited/credited by
//! market settlement, and never deleted.

use crate::{
    error::{Error, Result},
    storage::Partition,
    txn::Transaction,
    types::{Account, OrgId},
};

/// Create the account for `org` if absent; a no-op when it exists.
pub fn initialize(txn: &mut Transaction<'_>, org: &OrgId) -> Result<()> {
    if txn
        .get::<Account>(&Partition::Public, org.as_str())?
        .is_some()
    {
        return Ok(());
    }

    let account = Account::new(org);
    txn.put(&Partition::Public, org.as_str(), &account)?;

    tracing::debug!(org = %org, "Account initialized");
    Ok(())
}

/// Add `amount` to the org's balance. No upper bound is enforced.
pub fn credit(txn: &mut Transaction<'_>, org: &OrgId, amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(Error::InvalidArgument(
            "cannot add negative amount".to_string(),
        ));
    }

    let mut account = load(txn, org)?;
    account.balance += amount;
    save(txn, &account)?;

    tracing::debug!(org = %org, amount, balance = account.balance, "Account credited");
    Ok(())
}

/// Current balance of the org's account. Read-only.
pub fn balance(txn: &Transaction<'_>, org: &OrgId) -> Result<i64> {
    Ok(load(txn, org)?.balance)
}

/// Fetch the account record, mapping absence to the wording callers
/// match on.
pub(crate) fn load(txn: &Transaction<'_>, org: &OrgId) -> Result<Account> {
    txn.get(&Partition::Public, org.as_str())?
        .ok_or_else(|| Error::NotFound("account does not exist".to_string()))
}

pub(crate) fn save(txn: &mut Transaction<'_>, account: &Account) -> Result<()> {
    txn.put(&Partition::Public, account.id.as_str(), account)
}
