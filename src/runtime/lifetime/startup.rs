use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{EvalSystemError, Result};
use crate::models::users::requests::{NewRoleRecord, NewUser};
use crate::services::users::SEED_ADMIN_LOGIN_ID;
use crate::storage::Storage;
use crate::utils::password::{generate_temporary_password, hash_password};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

const MEMORY_CACHE: &str = "moka";

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let cache_type = AppConfig::get().cache.cache_type.as_str();
    warn!("Attempting to create {} cache backend", cache_type);

    match get_object_cache_plugin(cache_type) {
        Some(constructor) => match constructor().await {
            Ok(cache) => {
                warn!("Successfully created {} cache backend", cache_type);
                return Ok(Arc::from(cache));
            }
            Err(e) => warn!("Failed to create {} cache: {}", cache_type, e),
        },
        None => warn!("Cache backend '{}' not found in registry", cache_type),
    }

    if cache_type != MEMORY_CACHE
        && let Some(fallback) = get_object_cache_plugin(MEMORY_CACHE)
    {
        warn!("Falling back to memory cache");
        let cache = fallback().await?;
        warn!("Successfully created fallback Moka (in-memory) cache backend");
        return Ok(Arc::from(cache));
    }

    Err(EvalSystemError::cache_plugin_not_found(format!(
        "No cache backend available (tried: {cache_type})"
    )))
}

/// 初始化默认管理员账号
/// 如果数据库中没有任何用户，则创建登录编号为 admin 的账号
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users().await {
        Ok(count) if count > 0 => {
            debug!(
                "Database already has {} user(s), skipping admin seed",
                count
            );
            return;
        }
        Ok(_) => {
            info!("No users found in database, creating default admin account...");
        }
        Err(e) => {
            warn!("Failed to count users: {}, skipping admin seed", e);
            return;
        }
    }

    // 未通过环境变量提供密码时生成随机密码，并要求首次登录修改
    let (password, generated) = match std::env::var("ADMIN_PASSWORD") {
        Ok(pwd) if !pwd.is_empty() => (pwd, false),
        _ => {
            let pwd = generate_temporary_password(16);
            warn!("==========================================================");
            warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
            warn!("  Generated admin password: {}", pwd);
            warn!("  Please save this password or set ADMIN_PASSWORD env var");
            warn!("==========================================================");
            (pwd, true)
        }
    };

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin = NewUser {
        first_name: "System".to_string(),
        last_name: "Administrator".to_string(),
        email: None,
        department: None,
        password_hash,
        must_change_password: generated,
        record: NewRoleRecord::Admin {
            login_id: SEED_ADMIN_LOGIN_ID.to_string(),
        },
    };

    match storage.create_user(admin).await {
        Ok((user, _)) => {
            info!(
                "Default admin account created successfully (ID: {}, login id: {})",
                user.id, user.login_id
            );
        }
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
        }
    }
}

/// 准备服务器启动的上下文
/// 包括存储与缓存
pub async fn prepare_server_startup() -> Result<StartupContext> {
    // 重复安装只会返回 Err，忽略即可
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    seed_admin(&storage).await;

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    Ok(StartupContext { storage, cache })
}
