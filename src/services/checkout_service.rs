use chrono::Utc;
use tokio::task::JoinHandle;

use crate::{
    db::DbPool,
    dto::checkout::{CheckoutForm, Receipt},
    error::{AppError, AppResult},
    invoice::{Invoice, InvoiceClient},
    models::{OrderStatus, TransactionStatus},
    payments::PaymentGateway,
    repository::{
        customers::{self, NewCustomer},
        orders::{self, NewOrder},
        transactions::{self, NewTransaction},
        widgets,
    },
};

/// Ids written by a completed checkout.
#[derive(Debug)]
pub struct PurchaseOutcome {
    pub customer_id: i64,
    pub transaction_id: i64,
    pub order_id: i64,
    pub receipt: Receipt,
    /// Detached invoice notification; callers normally drop it.
    pub invoice_task: JoinHandle<()>,
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn parse_amount(raw: &str) -> AppResult<i64> {
    let amount: i64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid payment_amount {raw:?}")))?;
    if amount <= 0 {
        return Err(AppError::BadRequest("payment_amount must be positive".into()));
    }
    Ok(amount)
}

pub fn parse_widget_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid product_id {raw:?}")))
}

/// Validate the posted form and enrich it with card details from the gateway.
pub async fn transaction_data(
    payments: &dyn PaymentGateway,
    form: &CheckoutForm,
) -> AppResult<Receipt> {
    let email = required(&form.email, "email")?;
    let payment_intent = required(&form.payment_intent, "payment_intent")?;
    let payment_method = required(&form.payment_method, "payment_method")?;
    let amount = parse_amount(&form.payment_amount)?;

    let intent = payments.retrieve_payment_intent(&payment_intent).await?;
    if !intent.succeeded() {
        return Err(AppError::BadRequest(format!(
            "payment intent {} is {}",
            intent.id, intent.status
        )));
    }
    if intent.amount != amount {
        tracing::warn!(
            payment_intent = %intent.id,
            posted = amount,
            charged = intent.amount,
            "posted amount does not match payment intent"
        );
        return Err(AppError::BadRequest(
            "payment_amount does not match the charged amount".into(),
        ));
    }
    let bank_return_code = intent
        .bank_return_code()
        .ok_or_else(|| AppError::PaymentGateway(format!("payment intent {} has no charge", intent.id)))?
        .to_string();

    let method = payments.get_payment_method(&payment_method).await?;
    let card = method
        .card
        .ok_or_else(|| AppError::PaymentGateway(format!("payment method {} has no card", method.id)))?;

    let currency = match form.payment_currency.trim() {
        "" => intent.currency.clone(),
        posted => posted.to_string(),
    };

    Ok(Receipt {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email,
        payment_intent,
        payment_method,
        amount,
        currency,
        last_four: card.last4,
        expiry_month: card.exp_month,
        expiry_year: card.exp_year,
        bank_return_code,
    })
}

fn charged_transaction(data: &Receipt) -> NewTransaction {
    NewTransaction {
        amount: data.amount,
        currency: data.currency.clone(),
        last_four: data.last_four.clone(),
        expiry_month: data.expiry_month,
        expiry_year: data.expiry_year,
        payment_intent: data.payment_intent.clone(),
        payment_method: data.payment_method.clone(),
        bank_return_code: data.bank_return_code.clone(),
        status: TransactionStatus::Charged,
    }
}

/// Record a widget purchase: customer, transaction, then order, each
/// committed on its own, then hand the invoice to a detached task.
pub async fn complete_purchase(
    pool: &DbPool,
    payments: &dyn PaymentGateway,
    invoices: &InvoiceClient,
    form: CheckoutForm,
) -> AppResult<PurchaseOutcome> {
    let widget_id = parse_widget_id(&form.product_id)?;
    let receipt = transaction_data(payments, &form).await?;
    let widget = widgets::get_widget(pool, widget_id).await?;

    let customer_id = customers::insert_customer(
        pool,
        &NewCustomer {
            first_name: receipt.first_name.clone(),
            last_name: receipt.last_name.clone(),
            email: receipt.email.clone(),
        },
    )
    .await?;

    let transaction_id = transactions::insert_transaction(pool, &charged_transaction(&receipt)).await?;

    let order = NewOrder {
        widget_id: widget.id,
        transaction_id,
        customer_id,
        status: OrderStatus::Pending,
        quantity: 1,
        amount: receipt.amount,
    };
    let order_id = orders::insert_order(pool, &order).await?;
    tracing::info!(order_id, customer_id, transaction_id, widget_id, "order recorded");

    let invoice_task = invoices.notify(Invoice {
        id: order_id,
        quantity: order.quantity,
        amount: order.amount,
        product: widget.name,
        first_name: receipt.first_name.clone(),
        last_name: receipt.last_name.clone(),
        email: receipt.email.clone(),
        created_at: Utc::now(),
    });

    Ok(PurchaseOutcome {
        customer_id,
        transaction_id,
        order_id,
        receipt,
        invoice_task,
    })
}

/// Virtual terminal charges have no widget, customer or order.
pub async fn complete_terminal_payment(
    pool: &DbPool,
    payments: &dyn PaymentGateway,
    form: CheckoutForm,
) -> AppResult<Receipt> {
    let receipt = transaction_data(payments, &form).await?;
    let transaction_id = transactions::insert_transaction(pool, &charged_transaction(&receipt)).await?;
    tracing::info!(transaction_id, "virtual terminal charge recorded");
    Ok(receipt)
}
