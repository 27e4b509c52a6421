// ==========================================
// 房产 CRM 线索导入 - 配置层
// ==========================================
// 职责: 导入配置管理,支持文件 + 环境变量覆写
// 存储: JSON 文件（系统配置目录）
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ImportConfig};
