use mizan_core::{Expense, PostingProfile, PurchaseOrder};

/// Expense implied by saving `saved` over the previously stored `previous`.
///
/// Fires only on the edge into `Completed`: re-saving an order that was
/// already completed yields nothing.
pub fn completion_expense(
    previous: Option<&PurchaseOrder>,
    saved: &PurchaseOrder,
    profile: &dyn PostingProfile,
) -> Option<Expense> {
    let was_completed = previous.is_some_and(PurchaseOrder::is_completed);
    if !saved.is_completed() || was_completed {
        return None;
    }

    Some(Expense {
        category: profile.expense_categories().purchases,
        subcategory: Some(saved.request_type.as_str().to_string()),
        amount: saved.total_amount,
        date: saved.date,
        description: format!("Auto-Expense for {} ({})", saved.order_number, saved.notes),
        payment_method: Some("Cash".to_string()),
        receipt_url: (!saved.attachment_url.is_empty()).then(|| saved.attachment_url.clone()),
        approved: true,
        project_id: None,
        unit_id: None,
        branch_id: None,
    })
}
