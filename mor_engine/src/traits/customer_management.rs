use crate::{
    db_types::{Customer, CustomerPayment, NewPaymentHistory, PaymentHistory},
    mor_api::query_objects::{CustomerFilter, Paginated, Pagination},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait CustomerManagement {
    async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, StorageError>;

    async fn search_customers(
        &self,
        filter: CustomerFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Customer>, StorageError>;

    /// In a single atomic transaction,
    /// * fetches the customer keyed on `(account_id, email)`, creating it if it does not exist,
    /// * increments the customer's payment count and sets the last payment time,
    /// * stores the payment history entry against the customer.
    ///
    /// Returns the updated customer.
    async fn record_customer_payment(
        &self,
        customer: CustomerPayment,
        payment: NewPaymentHistory,
    ) -> Result<Customer, StorageError>;

    /// The customer's payment history, oldest first.
    async fn fetch_payment_history(&self, customer_id: i64) -> Result<Vec<PaymentHistory>, StorageError>;
}
