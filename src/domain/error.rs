/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 削除できない状態（例: 販売中の菜品を削除しようとした）
    #[error("Deletion not allowed: {0}")]
    DeletionNotAllowed(String),
    /// セットメニューの販売開始に失敗（販売停止中の菜品を含む）
    #[error("Setmeal enable failed: {0}")]
    SetmealEnableFailed(String),
    /// 無効な注文状態（例: 配達中の注文を確認しようとした）
    #[error("Invalid order state: {0}")]
    InvalidOrderState(String),
    /// 無効な数量（例: 0以下の数量）
    #[error("Invalid quantity")]
    InvalidQuantity,
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// 入力の検証失敗
    #[error("Validation failed: {0}")]
    Validation(String),
    /// ショッピングカートが空
    #[error("Shopping cart is empty")]
    ShoppingCartEmpty,
    /// 配送先住所が見つからない
    #[error("Address book not found")]
    AddressBookMissing,
    /// 店舗が営業時間外
    #[error("Shop is closed")]
    ShopClosed,
    /// パスワードが一致しない
    #[error("Password mismatch")]
    PasswordMismatch,
    /// アカウントがロックされている
    #[error("Account locked")]
    AccountLocked,
    /// 金額の計算が上限を超えた
    #[error("Amount overflow")]
    AmountOverflow,
    /// 販売停止中の商品
    #[error("Not on sale: {0}")]
    NotOnSale(String),
}
