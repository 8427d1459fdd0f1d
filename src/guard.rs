use crate::{
    error::{AppError, AppResult},
    session::SessionStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Landing,
    Login,
    AdminLogin,
    Register,
    Menu,
    Checkout,
    Orders,
    AdminDashboard,
    AdminFoods,
    AdminOrders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Customer,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Allow,
    Redirect(Page),
}

impl Page {
    pub fn access(&self) -> Access {
        match self {
            Page::Landing | Page::Login | Page::AdminLogin | Page::Register | Page::Menu => {
                Access::Public
            }
            Page::Checkout | Page::Orders => Access::Customer,
            Page::AdminDashboard | Page::AdminFoods | Page::AdminOrders => Access::Admin,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Page::Landing => "/",
            Page::Login => "/login",
            Page::AdminLogin => "/admin-login",
            Page::Register => "/register",
            Page::Menu => "/menu",
            Page::Checkout => "/checkout",
            Page::Orders => "/orders",
            Page::AdminDashboard => "/admin",
            Page::AdminFoods => "/admin/foods",
            Page::AdminOrders => "/admin/orders",
        }
    }
}

/// Where a visitor ends up when opening `page`.
pub fn check(page: Page, authenticated: bool, admin: bool) -> Guard {
    match page.access() {
        Access::Public => Guard::Allow,
        _ if !authenticated => match page.access() {
            Access::Admin => Guard::Redirect(Page::AdminLogin),
            _ => Guard::Redirect(Page::Login),
        },
        Access::Admin if !admin => Guard::Redirect(Page::Landing),
        _ => Guard::Allow,
    }
}

pub fn authorize(session: &SessionStore, page: Page) -> Guard {
    check(page, session.is_authenticated(), session.is_admin())
}

pub fn ensure_authenticated(session: &SessionStore) -> AppResult<()> {
    if !session.is_authenticated() {
        return Err(AppError::Unauthorized("Please log in first".into()));
    }
    Ok(())
}

pub fn ensure_admin(session: &SessionStore) -> AppResult<()> {
    ensure_authenticated(session)?;
    if !session.is_admin() {
        return Err(AppError::Forbidden("Admin access required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_pages_are_always_open() {
        for page in [Page::Landing, Page::Menu, Page::Login, Page::AdminLogin, Page::Register] {
            assert_eq!(check(page, false, false), Guard::Allow);
        }
    }

    #[test]
    fn anonymous_visitors_are_sent_to_the_matching_login() {
        assert_eq!(check(Page::Orders, false, false), Guard::Redirect(Page::Login));
        assert_eq!(check(Page::Checkout, false, false), Guard::Redirect(Page::Login));
        assert_eq!(check(Page::AdminOrders, false, false), Guard::Redirect(Page::AdminLogin));
    }

    #[test]
    fn customers_cannot_enter_admin_pages() {
        assert_eq!(check(Page::AdminFoods, true, false), Guard::Redirect(Page::Landing));
        assert_eq!(check(Page::Orders, true, false), Guard::Allow);
        assert_eq!(check(Page::AdminFoods, true, true), Guard::Allow);
    }
}
