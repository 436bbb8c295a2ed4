use sb_core::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
}

const fn item(label: &'static str, href: &'static str) -> NavItem {
    NavItem { label, href }
}

const COMMON: [NavItem; 5] = [
    item("Home", "/"),
    item("My Posts", "/my-posts"),
    item("Profile", "/profile"),
    item("New Post", "/new-post"),
    item("Categories", "/category"),
];

/// Sidebar entries for `role`. `Classes` is for teachers only; admins reach
/// moderation through `Pending Posts`.
pub fn navigation(role: Role) -> Vec<NavItem> {
    let mut items = COMMON.to_vec();
    if role == Role::Teacher {
        items.push(item("Classes", "/classes"));
    }
    if role.is_staff() {
        items.push(item("Search Student", "/search-student"));
        items.push(item("Pending Posts", "/pending-posts"));
    }
    items
}
