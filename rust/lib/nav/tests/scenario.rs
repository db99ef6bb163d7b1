//! End-to-end navigation scenarios through the public API.

use std::sync::{Arc, Mutex};

use openerp_nav::{
    AccessContext, ModuleAuth, ModuleConfig, NavConfig, PolicyRule, RedirectKind, RouteRule,
    RoutingContext, Scope, SiteAuthConfig, StaticIdentityProvider, User, resolve,
};

fn marketing_ctx(provider: StaticIdentityProvider) -> RoutingContext {
    let ctx = RoutingContext::new(Arc::new(provider));
    ctx.register_module(
        ModuleConfig::new("marketing").protect(
            "",
            RouteRule::allow().policy(PolicyRule::roles(["admin", "marketing"])),
        ),
    )
    .unwrap();
    ctx
}

#[test]
fn marketing_user_is_allowed() {
    let provider = StaticIdentityProvider::new();
    provider.grant("u1", "acme", ["marketing"], Vec::<String>::new());
    let ctx = marketing_ctx(provider);

    let decision = ctx.evaluate_access("marketing", "", Some(&User::new("u1")), "acme", &AccessContext::new());
    assert!(decision.allow);
    assert_eq!(decision.redirect_to, None);
}

#[test]
fn user_without_roles_redirected_to_site_login() {
    let ctx = marketing_ctx(StaticIdentityProvider::new());

    let decision = ctx.evaluate_access("marketing", "", Some(&User::new("u2")), "acme", &AccessContext::new());
    assert!(!decision.allow);
    assert_eq!(decision.redirect_to.as_deref(), Some("/acme/auth/login"));
}

#[test]
fn same_module_mounted_under_two_sites() {
    let provider = StaticIdentityProvider::new();
    provider.grant("u1", "acme", ["marketing"], Vec::<String>::new());
    let ctx = marketing_ctx(provider);
    ctx.register_site_auth_config("globex", SiteAuthConfig {
        login_route: Some("/sso/start".into()),
        ..Default::default()
    })
    .unwrap();

    let user = User::new("u1");
    let access = AccessContext::new();
    assert!(ctx.evaluate_access("marketing", "", Some(&user), "acme", &access).allow);

    let globex = ctx.evaluate_access("marketing", "", Some(&user), "globex", &access);
    assert!(!globex.allow);
    assert_eq!(globex.redirect_to.as_deref(), Some("/globex/sso/start"));
}

#[test]
fn id_replacement_heuristic() {
    assert_eq!(
        resolve("edit", "/site/mod/items/507f1f77bcf86cd799439011", Scope::Auto),
        "/site/mod/items/edit"
    );
}

#[test]
fn module_scope_from_any_depth() {
    for current in ["/site/mod", "/site/mod/sub", "/site/mod/auth/a/b/c"] {
        assert_eq!(resolve("t", current, Scope::Module), "/site/mod/t");
    }
}

#[test]
fn guarded_navigation_from_menu_click() {
    let provider = StaticIdentityProvider::new();
    provider.grant("alice", "acme", ["marketing"], ["campaign.create"]);
    let ctx = RoutingContext::new(Arc::new(provider));
    ctx.register_module(
        ModuleConfig::new("marketing")
            .with_auth(ModuleAuth {
                unauthorized_route: Some("forbidden".into()),
                ..Default::default()
            })
            .protect("", RouteRule::allow().policy(PolicyRule::roles(["@"])))
            .protect(
                "campaigns/create",
                RouteRule::allow()
                    .policy(PolicyRule::permissions(["campaign.create"]))
                    .redirect_to("campaigns"),
            ),
    )
    .unwrap();

    let menu = ctx.normalize_menu(
        &[serde_json::json!({"key": "new", "label": "New campaign", "url": "campaigns/create"})],
        Scope::Auto,
        "/acme/marketing/reports",
    );
    let url = menu[0].url.clone().unwrap();
    assert_eq!(url, "/acme/marketing/campaigns/create");

    let visited = Mutex::new(Vec::<String>::new());
    let nav = |p: &str| visited.lock().unwrap().push(p.to_string());

    let alice = ctx.navigate(&nav, &url, "/acme/marketing/reports", Scope::Auto, Some(&User::new("alice")), &AccessContext::new());
    assert!(alice.decision.allow);

    let bob = ctx.navigate(&nav, &url, "/acme/marketing/reports", Scope::Auto, Some(&User::new("bob")), &AccessContext::new());
    assert!(!bob.decision.allow);
    assert_eq!(bob.destination, "/acme/marketing/campaigns");

    assert_eq!(
        *visited.lock().unwrap(),
        vec!["/acme/marketing/campaigns/create", "/acme/marketing/campaigns"]
    );
    assert_eq!(
        ctx.get_redirect_route("marketing", RedirectKind::Unauthorized, "acme"),
        "/acme/marketing/forbidden"
    );
}

#[test]
fn bootstrap_from_config_text() {
    let ctx = NavConfig::parse(
        r#"
[[modules]]
name = "wallet"
public_routes = ["rates"]

[modules.protected_routes.""]
policies = [{ roles = ["@"] }]

[modules.protected_routes.transfers]
policies = [{ roles = ["treasurer"] }, { permissions = ["wallet.transfer"] }]

[[users]]
id = "tess"

[users.sites.acme]
roles = ["treasurer"]
"#,
    )
    .unwrap()
    .into_context()
    .unwrap();

    let tess = User::new("tess");
    let access = AccessContext::new();
    assert!(ctx.evaluate_access("wallet", "rates", None, "acme", &access).allow);
    assert!(ctx.evaluate_access("wallet", "balance", Some(&tess), "acme", &access).allow);

    let transfers = ctx.evaluate_access("wallet", "transfers/new", Some(&tess), "acme", &access);
    assert!(!transfers.allow);
    assert_eq!(transfers.failed_policy.as_deref(), Some("permissions:wallet.transfer"));
}
