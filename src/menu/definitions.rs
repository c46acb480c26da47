//! The production menu tree.
//!
//! `MAIN` routes its back key to Customer Service: the root has nowhere to go
//! back to, so `4` is repurposed as a fourth forward branch there. Branches
//! leave `4` unregistered so it falls through to back-navigation, and leaves
//! register nothing at all.

use super::catalog::{CatalogError, MenuCatalog};
use super::node::{Digit, MenuLevel, MenuNode};

pub const ROOT_ID: &str = "MAIN";

const BRANCHES: &[(&str, Digit, &str)] = &[
    (
        "SALES",
        Digit::One,
        "You have reached Sales. Press 1 for Product Information, Press 2 for New Orders, Press 3 for Sales Inquiries, Press 4 to return to the main menu.",
    ),
    (
        "SUPPORT",
        Digit::Two,
        "You have reached Support. Press 1 for Technical Support, Press 2 for Account Help, Press 3 for General Support, Press 4 to return to the main menu.",
    ),
    (
        "BILLING",
        Digit::Three,
        "You have reached Billing. Press 1 for Payment Options, Press 2 for Invoice Inquiries, Press 3 for Billing Disputes, Press 4 to return to the main menu.",
    ),
    (
        "CUSTOMER_SERVICE",
        Digit::Four,
        "You have reached Customer Service. Press 1 for General Inquiries, Press 2 for Feedback, Press 3 for Complaints, Press 4 to return to the main menu.",
    ),
];

// (parent, digit, id, prompt)
const LEAVES: &[(&str, Digit, &str, &str)] = &[
    ("SALES", Digit::One, "SALES_PRODUCT", "Product Information. Press 1 to hear about our latest products, Press 2 for pricing details, Press 3 for product catalog, Press 4 to return to Sales menu."),
    ("SALES", Digit::Two, "SALES_ORDERS", "New Orders. Press 1 to place a new order, Press 2 to check order status, Press 3 for order modifications, Press 4 to return to Sales menu."),
    ("SALES", Digit::Three, "SALES_INQUIRIES", "Sales Inquiries. Press 1 for partnership opportunities, Press 2 for bulk orders, Press 3 for quotes, Press 4 to return to Sales menu."),
    ("SUPPORT", Digit::One, "SUPPORT_TECHNICAL", "Technical Support. Press 1 for software issues, Press 2 for hardware issues, Press 3 for connectivity problems, Press 4 to return to Support menu."),
    ("SUPPORT", Digit::Two, "SUPPORT_ACCOUNT", "Account Help. Press 1 for password reset, Press 2 for account settings, Press 3 for profile updates, Press 4 to return to Support menu."),
    ("SUPPORT", Digit::Three, "SUPPORT_GENERAL", "General Support. Press 1 for FAQs, Press 2 for user guides, Press 3 for tutorials, Press 4 to return to Support menu."),
    ("BILLING", Digit::One, "BILLING_PAYMENT", "Payment Options. Press 1 for credit card payment, Press 2 for bank transfer, Press 3 for payment plans, Press 4 to return to Billing menu."),
    ("BILLING", Digit::Two, "BILLING_INVOICE", "Invoice Inquiries. Press 1 to request an invoice copy, Press 2 for payment history, Press 3 for invoice disputes, Press 4 to return to Billing menu."),
    ("BILLING", Digit::Three, "BILLING_DISPUTES", "Billing Disputes. Press 1 to file a dispute, Press 2 to check dispute status, Press 3 for refund requests, Press 4 to return to Billing menu."),
    ("CUSTOMER_SERVICE", Digit::One, "CS_INQUIRIES", "General Inquiries. Press 1 for business hours, Press 2 for locations, Press 3 for contact information, Press 4 to return to Customer Service menu."),
    ("CUSTOMER_SERVICE", Digit::Two, "CS_FEEDBACK", "Feedback. Press 1 to leave a compliment, Press 2 for suggestions, Press 3 for service improvement ideas, Press 4 to return to Customer Service menu."),
    ("CUSTOMER_SERVICE", Digit::Three, "CS_COMPLAINTS", "Complaints. Press 1 to file a complaint, Press 2 to check complaint status, Press 3 to escalate, Press 4 to return to Customer Service menu."),
];

const ROOT_PROMPT: &str = "Welcome to our IVR system. Press 1 for Sales, Press 2 for Support, Press 3 for Billing, Press 4 for Customer Service.";

impl MenuCatalog {
    pub fn standard() -> Result<MenuCatalog, CatalogError> {
        let mut builder = MenuCatalog::builder().node(MenuNode::root(ROOT_ID, ROOT_PROMPT));

        for (id, digit, prompt) in BRANCHES {
            builder = builder
                .node(MenuNode::child(*id, MenuLevel::Branch, *prompt, ROOT_ID))
                .transition(ROOT_ID, *digit, id);
        }

        for (parent, digit, id, prompt) in LEAVES {
            builder = builder
                .node(MenuNode::child(*id, MenuLevel::Leaf, *prompt, *parent))
                .transition(parent, *digit, id);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tree_is_valid() {
        let catalog = MenuCatalog::standard().unwrap();
        assert_eq!(catalog.len(), 17);
        assert_eq!(catalog.root().id, ROOT_ID);
        assert_eq!(catalog.root().level, MenuLevel::Root);
    }

    #[test]
    fn root_overrides_back_key() {
        let catalog = MenuCatalog::standard().unwrap();
        let target = catalog.next_for(ROOT_ID, Digit::BACK).unwrap();
        assert_eq!(target.id, "CUSTOMER_SERVICE");
    }

    #[test]
    fn forward_transitions_match_the_tree() {
        let catalog = MenuCatalog::standard().unwrap();
        let cases = [
            ("MAIN", Digit::One, "SALES"),
            ("MAIN", Digit::Two, "SUPPORT"),
            ("MAIN", Digit::Three, "BILLING"),
            ("SALES", Digit::One, "SALES_PRODUCT"),
            ("SALES", Digit::Two, "SALES_ORDERS"),
            ("SALES", Digit::Three, "SALES_INQUIRIES"),
            ("SUPPORT", Digit::One, "SUPPORT_TECHNICAL"),
            ("BILLING", Digit::Three, "BILLING_DISPUTES"),
            ("CUSTOMER_SERVICE", Digit::Two, "CS_FEEDBACK"),
        ];
        for (from, digit, expected) in cases {
            assert_eq!(catalog.next_for(from, digit).unwrap().id, expected);
        }
    }

    #[test]
    fn branches_leave_back_key_unregistered() {
        let catalog = MenuCatalog::standard().unwrap();
        for branch in ["SALES", "SUPPORT", "BILLING", "CUSTOMER_SERVICE"] {
            assert!(catalog.next_for(branch, Digit::BACK).is_none());
            assert_eq!(catalog.children(branch).len(), 3);
        }
    }

    #[test]
    fn leaves_are_terminal_dead_ends() {
        let catalog = MenuCatalog::standard().unwrap();
        for leaf in ["SALES_PRODUCT", "SUPPORT_TECHNICAL", "CS_COMPLAINTS"] {
            assert!(catalog.is_terminal(leaf));
            for digit in [Digit::One, Digit::Two, Digit::Three, Digit::Four] {
                assert!(catalog.next_for(leaf, digit).is_none());
            }
        }
        assert!(!catalog.is_terminal("MAIN"));
        assert!(!catalog.is_terminal("SALES"));
    }
}
