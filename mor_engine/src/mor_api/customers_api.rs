use std::fmt::Debug;

use crate::{
    db_types::{Customer, PaymentHistory},
    mor_api::{
        errors::MorApiError,
        principal::Principal,
        query_objects::{CustomerFilter, Paginated, Pagination},
    },
    traits::CustomerManagement,
};

/// Read access to the customers that have paid a merchant, as learnt from provider webhooks.
pub struct CustomersApi<B> {
    db: B,
}

impl<B: Debug> Debug for CustomersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CustomersApi ({:?})", self.db)
    }
}

impl<B> CustomersApi<B>
where B: CustomerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The caller's customers. `search` matches email, first name or last name.
    pub async fn list_customers(
        &self,
        principal: &Principal,
        search: Option<String>,
        pagination: Pagination,
    ) -> Result<Paginated<Customer>, MorApiError> {
        let filter = CustomerFilter {
            account_id: Some(principal.account_id),
            search: search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        };
        let customers = self.db.search_customers(filter, pagination).await?;
        Ok(customers)
    }

    /// Payment history of one of the caller's customers.
    pub async fn payment_history(
        &self,
        principal: &Principal,
        customer_id: i64,
    ) -> Result<Vec<PaymentHistory>, MorApiError> {
        match self.db.fetch_customer(customer_id).await? {
            Some(c) if c.account_id == principal.account_id => Ok(self.db.fetch_payment_history(customer_id).await?),
            _ => Err(MorApiError::not_found(format!("Customer #{customer_id}"))),
        }
    }
}
