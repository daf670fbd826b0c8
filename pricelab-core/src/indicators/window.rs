use serde::Serialize;

/// Series length from which the ideal windows are used unchanged.
pub const FULL_HISTORY: usize = 50;

pub const MA_WINDOW: usize = 20;
pub const MA_LONG_WINDOW: usize = 50;
pub const BOLLINGER_WINDOW: usize = 20;
pub const RSI_WINDOW: usize = 14;

/// Window sizes chosen for one series length.
///
/// Short series (under 50 bars) shrink the MA, Bollinger and RSI windows to
/// half the history so the statistics still mean something. A window of 0
/// is evaluated as 1 by every indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowPlan {
    pub ma: usize,
    pub ma_long: usize,
    pub bollinger: usize,
    pub rsi: usize,
}

impl WindowPlan {
    pub fn for_len(len: usize) -> Self {
        if len < FULL_HISTORY {
            let half = len / 2;
            Self {
                ma: MA_WINDOW.min(half),
                ma_long: MA_LONG_WINDOW.min(len),
                bollinger: BOLLINGER_WINDOW.min(half),
                rsi: RSI_WINDOW.min(half),
            }
        } else {
            Self {
                ma: MA_WINDOW,
                ma_long: MA_LONG_WINDOW,
                bollinger: BOLLINGER_WINDOW,
                rsi: RSI_WINDOW,
            }
        }
    }
}
