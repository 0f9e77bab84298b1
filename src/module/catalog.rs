//! The built-in module catalog.
//!
//! Template trees for these modules live under `<template root>/modules/<id>`;
//! each tree may carry a `pubspec.partial.yaml` with its package dependencies.

use super::{Contributions, ModuleKey, ModuleManifest, PlatformGated, Provider, Route};
use serde_json::{json, Map, Value};

fn settings(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn provider(name: &str, import: &str) -> Provider {
    Provider { name: name.to_string(), import: Some(import.to_string()), create: None }
}

fn route(path: &str, screen: &str, import: &str) -> Route {
    Route { path: path.to_string(), screen: screen.to_string(), import: Some(import.to_string()) }
}

/// Every catalog module, in registration order.
pub fn builtin_modules() -> Vec<ModuleManifest> {
    vec![
        ModuleManifest::new("routing", "Routing")
            .with_description("Declarative navigation with go_router")
            .with_priority(10),
        ModuleManifest::new("state", "State management")
            .with_description("Riverpod providers and code-generated notifiers")
            .with_defaults(settings(json!({"library": "riverpod"})))
            .with_priority(10),
        ModuleManifest::new("api", "HTTP API client")
            .with_description("Dio client with retrofit-generated services")
            .with_defaults(settings(json!({"timeout_seconds": 30})))
            .with_contributions(Contributions {
                providers: vec![provider("ApiClient", "core/network/api_client.dart")],
                env: vec!["API_BASE_URL".to_string()],
                ..Contributions::default()
            }),
        ModuleManifest::new("database", "Local database")
            .with_description("Drift (SQLite) persistence layer")
            .with_defaults(settings(json!({"engine": "drift"})))
            .with_contributions(Contributions {
                providers: vec![provider("AppDatabase", "core/database/app_database.dart")],
                ..Contributions::default()
            }),
        ModuleManifest::new("auth", "Authentication")
            .with_description("Sign-in flow with secure token storage")
            .with_requires(["routing"])
            .with_defaults(settings(json!({"provider": "email"})))
            .with_contributions(Contributions {
                providers: vec![provider("AuthRepository", "features/auth/auth_repository.dart")],
                routes: vec![route("/login", "LoginScreen", "features/auth/login_screen.dart")],
                ..Contributions::default()
            }),
        ModuleManifest::new("localization", "Localization")
            .with_description("flutter_localizations with ARB message catalogs")
            .with_defaults(settings(json!({"locales": ["en"]}))),
        ModuleManifest::new("offline_sync", "Offline sync")
            .with_description("Queue API writes in the local database while offline")
            .with_requires(["api", "database"])
            .with_contributions(Contributions {
                providers: vec![provider("SyncQueue", "features/sync/sync_queue.dart")],
                ..Contributions::default()
            }),
        ModuleManifest::new("push", "Push notifications")
            .with_description("Firebase Cloud Messaging on mobile targets")
            .with_enablement(PlatformGated {
                key: ModuleKey("push".to_string()),
                platforms: vec!["android".to_string(), "ios".to_string()],
            })
            .with_contributions(Contributions {
                providers: vec![provider("PushService", "features/push/push_service.dart")],
                env: vec!["FIREBASE_PROJECT_ID".to_string()],
                ..Contributions::default()
            }),
    ]
}
