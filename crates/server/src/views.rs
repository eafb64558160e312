//! Engine values rendered as API bodies.

use api_types::{
    application::ApplicationView,
    loan::{LoanDetailResponse, LoanView, SplitView},
    payment::{AllocationNew, AllocationView, PaymentView},
    user::{AccountView, TransactionHistoryResponse, TransactionView},
};
use engine::{
    Allocation, AllocationSpec, BankAccount, BankTransaction, CreditApplication, Loan,
    LoanDetail, LoanSplit, Payment, TransactionHistory,
};

pub(crate) fn loan(loan: &Loan) -> LoanView {
    LoanView {
        id: loan.id,
        user_id: loan.user_id,
        original_amount: loan.original_amount.to_string(),
        interest_rate: loan.interest_rate.to_string(),
        status: loan.status.as_str().to_string(),
        purpose: loan.purpose.clone(),
        taken_at: loan.taken_at,
    }
}

fn split(split: &LoanSplit) -> SplitView {
    SplitView {
        id: split.id,
        bank_id: split.bank_id,
        split_amount: split.split_amount.to_string(),
        remaining_principal: split.remaining_principal.to_string(),
    }
}

fn allocation(allocation: &Allocation) -> AllocationView {
    AllocationView {
        id: allocation.id,
        split_id: allocation.split_id,
        principal_paid: allocation.principal_paid.to_string(),
        interest_paid: allocation.interest_paid.to_string(),
    }
}

pub(crate) fn payment(payment: &Payment) -> PaymentView {
    PaymentView {
        id: payment.id,
        loan_id: payment.loan_id,
        paid_at: payment.paid_at,
        total_amount: payment.total_amount.to_string(),
        comment: payment.comment.clone(),
        allocations: payment.allocations.iter().map(allocation).collect(),
    }
}

pub(crate) fn planned(spec: &AllocationSpec) -> AllocationNew {
    AllocationNew {
        split_id: spec.split_id,
        principal_paid: spec.principal_paid.to_string(),
        interest_paid: spec.interest_paid.to_string(),
    }
}

pub(crate) fn loan_detail(detail: &LoanDetail) -> LoanDetailResponse {
    LoanDetailResponse {
        loan: loan(&detail.loan),
        splits: detail.splits.iter().map(split).collect(),
        percent_paid: detail.percent_paid.to_string(),
        remaining_debt: detail.remaining_debt.to_string(),
        payment_history: detail.payment_history.iter().map(payment).collect(),
    }
}

pub(crate) fn application(application: &CreditApplication) -> ApplicationView {
    ApplicationView {
        id: application.id,
        bank_id: application.bank_id,
        type_code: application.type_code.clone(),
        status: application.status.as_str().to_string(),
        requested_amount: application.requested_amount.to_string(),
        loan_id: application.loan_id,
        submitted_at: application.submitted_at,
        updated_at: application.updated_at,
    }
}

pub(crate) fn account(account: &BankAccount) -> AccountView {
    AccountView {
        id: account.id,
        bank_id: account.bank_id,
        balance: account.balance.to_string(),
        currency: account.currency.clone(),
    }
}

fn transaction(tx: &BankTransaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        bank_id: tx.bank_id,
        occurred_at: tx.occurred_at,
        amount: tx.amount.to_string(),
        category: tx.category.clone(),
        description: tx.description.clone(),
    }
}

pub(crate) fn history(history: &TransactionHistory) -> TransactionHistoryResponse {
    TransactionHistoryResponse {
        transactions: history.transactions.iter().map(transaction).collect(),
        total_spent: history.total_spent.to_string(),
    }
}
