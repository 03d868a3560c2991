//! Wire ids and default deadlines of every known device action.

use std::time::Duration;

/// Deadline used for action ids that are not in the catalog.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_millis(8000);

/// A device action: its wire id and default deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub id: &'static str,
    pub default_timeout: Duration,
}

impl ActionSpec {
    pub const fn new(id: &'static str, timeout_ms: u64) -> Self {
        Self {
            id,
            default_timeout: Duration::from_millis(timeout_ms),
        }
    }
}

// ── Application lifecycle and info ──────────────────────────────────────────

pub const OPEN_APP: ActionSpec = ActionSpec::new("open_app", 5000);
pub const OPEN_APP_DEEP_LINK: ActionSpec = ActionSpec::new("open_app_deep_link", 5000);
pub const CHECK_APP_INSTALLED: ActionSpec = ActionSpec::new("check_app_installed", 5000);
pub const CHECK_APP_ENABLED: ActionSpec = ActionSpec::new("check_app_enabled", 5000);
pub const CHECK_APP_SYSTEM: ActionSpec = ActionSpec::new("check_app_system", 5000);
pub const CHECK_APP_RUNNING: ActionSpec = ActionSpec::new("check_app_running", 5000);
pub const CHECK_APP_PERMISSION_GRANTED: ActionSpec =
    ActionSpec::new("check_app_permission_granted", 5000);
pub const GET_APP_INSTALLED: ActionSpec = ActionSpec::new("get_app_installed", 5000);
pub const GET_APP_NAME: ActionSpec = ActionSpec::new("get_app_name", 5000);
pub const GET_APP_VERSION_CODE: ActionSpec = ActionSpec::new("get_app_version_code", 5000);
pub const GET_APP_VERSION_NAME: ActionSpec = ActionSpec::new("get_app_version_name", 5000);
pub const GET_TOP_ACTIVITY_INFO: ActionSpec = ActionSpec::new("get_top_activity_info", 5000);
pub const INSTALL_APP: ActionSpec = ActionSpec::new("install_app", 30000);
pub const INSTALL_APP_FROM_URL: ActionSpec = ActionSpec::new("install_app_from_url", 60000);
pub const CLEAR_APP_DATA: ActionSpec = ActionSpec::new("clear_app_data", 15000);
pub const FORCE_STOP_APP: ActionSpec = ActionSpec::new("force_stop_app", 15000);
pub const UNINSTALL_APP: ActionSpec = ActionSpec::new("uninstall_app", 15000);

// ── WebView ─────────────────────────────────────────────────────────────────

pub const GET_WEBVIEW_PAGE_SOURCE: ActionSpec = ActionSpec::new("get_webview_page_source", 5000);
pub const EVALUATE_JAVASCRIPT_IN_WEBVIEW: ActionSpec =
    ActionSpec::new("evaluate_javascript_in_webview", 15000);
pub const GO_TO_URL_IN_WEBVIEW: ActionSpec = ActionSpec::new("go_to_url_in_webview", 5000);
pub const RELOAD_PAGE_IN_WEBVIEW: ActionSpec = ActionSpec::new("reload_page_in_webview", 5000);
pub const GO_BACK_IN_WEBVIEW: ActionSpec = ActionSpec::new("go_back_in_webview", 5000);
pub const GO_FORWARD_IN_WEBVIEW: ActionSpec = ActionSpec::new("go_forward_in_webview", 5000);

// ── Device state ────────────────────────────────────────────────────────────

pub const CHECK_WIFI_ENABLED: ActionSpec = ActionSpec::new("check_wifi_enabled", 5000);
pub const CHECK_MOBILE_DATA_ENABLED: ActionSpec =
    ActionSpec::new("check_mobile_data_enabled", 5000);
pub const CHECK_POWER_CONNECTED: ActionSpec = ActionSpec::new("check_power_connected", 5000);
pub const CHECK_AIRPLANE_MODE_ENABLED: ActionSpec =
    ActionSpec::new("check_airplane_mode_enabled", 5000);
pub const CHECK_VPN_ENABLED: ActionSpec = ActionSpec::new("check_vpn_enabled", 5000);
pub const CHECK_SIM_CARD_EXISTS: ActionSpec = ActionSpec::new("check_sim_card_exists", 5000);
pub const CHECK_GPS_ENABLED: ActionSpec = ActionSpec::new("check_gps_enabled", 5000);
pub const CHECK_USB_DEBUG_ENABLED: ActionSpec = ActionSpec::new("check_usb_debug_enabled", 5000);
pub const CHECK_ADB_ENABLED: ActionSpec = ActionSpec::new("check_adb_enabled", 5000);
pub const CHECK_ADB_RUNNING: ActionSpec = ActionSpec::new("check_adb_running", 5000);
pub const CHECK_ROOTED: ActionSpec = ActionSpec::new("check_rooted", 5000);
pub const GET_CLIPBOARD: ActionSpec = ActionSpec::new("get_clipboard", 5000);
pub const SET_CLIPBOARD: ActionSpec = ActionSpec::new("set_clipboard", 5000);
pub const SET_WIFI_ENABLED: ActionSpec = ActionSpec::new("set_wifi_enabled", 5000);
pub const CONNECT_WIFI: ActionSpec = ActionSpec::new("connect_wifi", 15000);

// ── Navigation keys ─────────────────────────────────────────────────────────

pub const BACK: ActionSpec = ActionSpec::new("back", 5000);
pub const HOME: ActionSpec = ActionSpec::new("home", 5000);
pub const RECENT: ActionSpec = ActionSpec::new("recent", 5000);
pub const POWER: ActionSpec = ActionSpec::new("power", 5000);
pub const LOCKSCREEN: ActionSpec = ActionSpec::new("lockscreen", 5000);
pub const NOTIFICATION: ActionSpec = ActionSpec::new("notification", 5000);

// ── Keyboard ────────────────────────────────────────────────────────────────

pub const KEYBOARD_INPUT_TEXT: ActionSpec = ActionSpec::new("keyboard_input_text", 5000);
pub const KEYBOARD_APPEND_TEXT: ActionSpec = ActionSpec::new("keyboard_append_text", 5000);
pub const KEYBOARD_GET_TEXT: ActionSpec = ActionSpec::new("keyboard_get_text", 5000);
pub const KEYBOARD_GET_SELECTION_TEXT: ActionSpec =
    ActionSpec::new("keyboard_get_selection_text", 5000);
pub const KEYBOARD_GET_SELECTION: ActionSpec = ActionSpec::new("keyboard_get_selection", 5000);
pub const KEYBOARD_SET_SELECTION: ActionSpec = ActionSpec::new("keyboard_set_selection", 5000);
pub const KEYBOARD_CLEAR_TEXT: ActionSpec = ActionSpec::new("keyboard_clear_text", 5000);
pub const KEYBOARD_IS_SHOWN: ActionSpec = ActionSpec::new("keyboard_is_shown", 5000);

// ── Pointer ─────────────────────────────────────────────────────────────────

pub const MOUSE_CLICK: ActionSpec = ActionSpec::new("mouse_click", 5000);
pub const MOUSE_SWIPE: ActionSpec = ActionSpec::new("mouse_swipe", 5000);
pub const SCROLL_FORWARD: ActionSpec = ActionSpec::new("scroll_forward", 5000);
pub const SCROLL_BACKWARD: ActionSpec = ActionSpec::new("scroll_backward", 5000);

// ── Screen ──────────────────────────────────────────────────────────────────

pub const TAKE_SCREENSHOT: ActionSpec = ActionSpec::new("take_screenshot", 10000);
pub const TAKE_SCREENSHOT_TO_FILE: ActionSpec = ActionSpec::new("take_screenshot_to_file", 10000);
pub const DUMP_SCREEN_XML: ActionSpec = ActionSpec::new("dump_screen_xml", 10000);

// ── Finders ─────────────────────────────────────────────────────────────────

pub const FIND_NODE: ActionSpec = ActionSpec::new("find_node", 15000);
pub const FIND_NODES: ActionSpec = ActionSpec::new("find_nodes", 15000);
pub const FIND_NODE_EXIST: ActionSpec = ActionSpec::new("find_node_exist", 15000);
pub const FIND_NODE_AND_CLICK: ActionSpec = ActionSpec::new("find_node_and_click", 15000);
pub const FIND_NODE_AND_SCROLL: ActionSpec = ActionSpec::new("find_node_and_scroll", 15000);
pub const FIND_COLOR_AND_CLICK: ActionSpec = ActionSpec::new("find_color_and_click", 15000);
pub const FIND_COLOR_EXIST: ActionSpec = ActionSpec::new("find_color_exist", 15000);
pub const FIND_COLOR: ActionSpec = ActionSpec::new("find_color", 15000);
pub const FIND_IMAGE: ActionSpec = ActionSpec::new("find_image", 15000);

// ── Proxy ───────────────────────────────────────────────────────────────────

pub const CURRENT_PROXY: ActionSpec = ActionSpec::new("current_proxy", 5000);
pub const CONNECT_PROXY: ActionSpec = ActionSpec::new("connect_proxy", 5000);
pub const CHECK_PROXY_CONNECTED: ActionSpec = ActionSpec::new("check_proxy_connected", 5000);
pub const CHECK_PROXY_HAS_INTERNET: ActionSpec =
    ActionSpec::new("check_proxy_has_internet", 15000);
pub const GET_PROXY_IP_INFO: ActionSpec = ActionSpec::new("get_proxy_ip_info", 15000);

// ── System ──────────────────────────────────────────────────────────────────

pub const EXECUTE_COMMAND: ActionSpec = ActionSpec::new("execute_command", 15000);
pub const VIBRATE: ActionSpec = ActionSpec::new("vibrate", 5000);
pub const CHANGE_VOLUME: ActionSpec = ActionSpec::new("change_volume", 5000);
pub const REBOOT_DEVICE: ActionSpec = ActionSpec::new("reboot_device", 5000);
pub const GET_DEVICE_INFO: ActionSpec = ActionSpec::new("get_device_info", 5000);

// ── Filesystem ──────────────────────────────────────────────────────────────

pub const CREATE_FOLDER: ActionSpec = ActionSpec::new("create_folder", 5000);
pub const DELETE_FILE: ActionSpec = ActionSpec::new("delete_file", 5000);
pub const DELETE_FOLDER: ActionSpec = ActionSpec::new("delete_folder", 5000);
pub const READ_FILE: ActionSpec = ActionSpec::new("read_file", 5000);
pub const WRITE_FILE: ActionSpec = ActionSpec::new("write_file", 5000);
pub const CHECK_IS_FILE: ActionSpec = ActionSpec::new("check_is_file", 5000);
pub const CHECK_IS_FOLDER: ActionSpec = ActionSpec::new("check_is_folder", 5000);
pub const CHECK_FOLDER_EXIST: ActionSpec = ActionSpec::new("check_folder_exist", 5000);
pub const CHECK_FILE_EXIST: ActionSpec = ActionSpec::new("check_file_exist", 5000);
pub const LIST_CHILD_FILES: ActionSpec = ActionSpec::new("list_child_files", 5000);
pub const DELETE_ALL_IMAGE_GALLERY: ActionSpec =
    ActionSpec::new("delete_all_image_gallery", 15000);
pub const INSERT_IMAGE_GALLERY: ActionSpec = ActionSpec::new("insert_image_gallery", 5000);

// ── App info and backup ─────────────────────────────────────────────────────

pub const INSTALL_CHANGE_INFO_APP: ActionSpec =
    ActionSpec::new("install_change_info_app", 180000);
pub const CHANGE_APP_INFO: ActionSpec = ActionSpec::new("change_app_info", 10000);
pub const BACKUP_APP_DATA: ActionSpec = ActionSpec::new("backup_app_data", 15000);
pub const RESTORE_APP_DATA: ActionSpec = ActionSpec::new("restore_app_data", 15000);
pub const READ_APP_DATA: ActionSpec = ActionSpec::new("read_app_data", 15000);
pub const BACKUP_AND_UPLOAD_ACCOUNT: ActionSpec =
    ActionSpec::new("backup_and_upload_account", 15000);

/// Every catalogued action.
pub const ALL: &[ActionSpec] = &[
    OPEN_APP,
    OPEN_APP_DEEP_LINK,
    CHECK_APP_INSTALLED,
    CHECK_APP_ENABLED,
    CHECK_APP_SYSTEM,
    CHECK_APP_RUNNING,
    CHECK_APP_PERMISSION_GRANTED,
    GET_APP_INSTALLED,
    GET_APP_NAME,
    GET_APP_VERSION_CODE,
    GET_APP_VERSION_NAME,
    GET_TOP_ACTIVITY_INFO,
    INSTALL_APP,
    INSTALL_APP_FROM_URL,
    CLEAR_APP_DATA,
    FORCE_STOP_APP,
    UNINSTALL_APP,
    GET_WEBVIEW_PAGE_SOURCE,
    EVALUATE_JAVASCRIPT_IN_WEBVIEW,
    GO_TO_URL_IN_WEBVIEW,
    RELOAD_PAGE_IN_WEBVIEW,
    GO_BACK_IN_WEBVIEW,
    GO_FORWARD_IN_WEBVIEW,
    CHECK_WIFI_ENABLED,
    CHECK_MOBILE_DATA_ENABLED,
    CHECK_POWER_CONNECTED,
    CHECK_AIRPLANE_MODE_ENABLED,
    CHECK_VPN_ENABLED,
    CHECK_SIM_CARD_EXISTS,
    CHECK_GPS_ENABLED,
    CHECK_USB_DEBUG_ENABLED,
    CHECK_ADB_ENABLED,
    CHECK_ADB_RUNNING,
    CHECK_ROOTED,
    GET_CLIPBOARD,
    SET_CLIPBOARD,
    SET_WIFI_ENABLED,
    CONNECT_WIFI,
    BACK,
    HOME,
    RECENT,
    POWER,
    LOCKSCREEN,
    NOTIFICATION,
    KEYBOARD_INPUT_TEXT,
    KEYBOARD_APPEND_TEXT,
    KEYBOARD_GET_TEXT,
    KEYBOARD_GET_SELECTION_TEXT,
    KEYBOARD_GET_SELECTION,
    KEYBOARD_SET_SELECTION,
    KEYBOARD_CLEAR_TEXT,
    KEYBOARD_IS_SHOWN,
    MOUSE_CLICK,
    MOUSE_SWIPE,
    SCROLL_FORWARD,
    SCROLL_BACKWARD,
    TAKE_SCREENSHOT,
    TAKE_SCREENSHOT_TO_FILE,
    DUMP_SCREEN_XML,
    FIND_NODE,
    FIND_NODES,
    FIND_NODE_EXIST,
    FIND_NODE_AND_CLICK,
    FIND_NODE_AND_SCROLL,
    FIND_COLOR_AND_CLICK,
    FIND_COLOR_EXIST,
    FIND_COLOR,
    FIND_IMAGE,
    CURRENT_PROXY,
    CONNECT_PROXY,
    CHECK_PROXY_CONNECTED,
    CHECK_PROXY_HAS_INTERNET,
    GET_PROXY_IP_INFO,
    EXECUTE_COMMAND,
    VIBRATE,
    CHANGE_VOLUME,
    REBOOT_DEVICE,
    GET_DEVICE_INFO,
    CREATE_FOLDER,
    DELETE_FILE,
    DELETE_FOLDER,
    READ_FILE,
    WRITE_FILE,
    CHECK_IS_FILE,
    CHECK_IS_FOLDER,
    CHECK_FOLDER_EXIST,
    CHECK_FILE_EXIST,
    LIST_CHILD_FILES,
    DELETE_ALL_IMAGE_GALLERY,
    INSERT_IMAGE_GALLERY,
    INSTALL_CHANGE_INFO_APP,
    CHANGE_APP_INFO,
    BACKUP_APP_DATA,
    RESTORE_APP_DATA,
    READ_APP_DATA,
    BACKUP_AND_UPLOAD_ACCOUNT,
];

/// Look up a catalogued action by wire id.
pub fn lookup(id: &str) -> Option<&'static ActionSpec> {
    ALL.iter().find(|spec| spec.id == id)
}

/// Default deadline for `id`, falling back to [`DEFAULT_ACTION_TIMEOUT`].
pub fn default_timeout_for(id: &str) -> Duration {
    lookup(id)
        .map(|spec| spec.default_timeout)
        .unwrap_or(DEFAULT_ACTION_TIMEOUT)
}
