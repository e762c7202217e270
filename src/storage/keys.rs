pub const ACCESS_TOKEN: &str = "token";
pub const REFRESH_TOKEN: &str = "refreshToken";
pub const USER: &str = "user";
pub const NOTIFICATIONS: &str = "notifications";
pub const UNREAD_COUNT: &str = "unreadCount";
pub const READ_NOTIFICATION_IDS: &str = "readNotificationIds";
pub const SIDEBAR_COLLAPSED: &str = "sidebarCollapsed";
