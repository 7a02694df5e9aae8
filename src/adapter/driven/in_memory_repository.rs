// インメモリリポジトリ
// 開発環境とテストで使うポート実装。データはプロセス内にのみ保持する

use crate::domain::model::{
    AddressBook, AddressBookId, CartItem, CartItemId, Dish, DishId, Employee, EmployeeId, Money,
    Order, OrderId, OrderStatus, Page, PageRequest, Setmeal, SetmealId, ShoppingCart, Status,
    User, UserId,
};
use crate::domain::port::{
    AddressBookRepository, DishRepository, EmployeeRepository, MenuQuery, OrderQuery,
    OrderRepository, RepositoryError, SalesRank, SetmealRepository, ShoppingCartRepository,
    UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|e| RepositoryError::OperationFailed(format!("ロックの取得に失敗しました: {}", e)))
}

/// 並べ替え済みの一覧からページを切り出す
fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let records = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.page_size() as usize)
        .collect();
    Page::new(total, records)
}

fn matches_menu(
    query: &MenuQuery,
    name: &str,
    category_id: crate::domain::model::CategoryId,
    status: Status,
) -> bool {
    query.name.as_deref().map_or(true, |n| name.contains(n))
        && query.category_id.map_or(true, |c| c == category_id)
        && query.status.map_or(true, |s| s == status)
}

/// インメモリ従業員リポジトリ
#[derive(Default)]
pub struct InMemoryEmployeeRepository {
    employees: Mutex<HashMap<EmployeeId, Employee>>,
}

impl InMemoryEmployeeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn save(&self, employee: &Employee) -> Result<(), RepositoryError> {
        let mut employees = lock(&self.employees)?;
        let duplicated = employees
            .values()
            .any(|e| e.username() == employee.username() && e.id() != employee.id());
        if duplicated {
            return Err(RepositoryError::DuplicateEntry(format!(
                "ユーザー名が既に使われています: {}",
                employee.username()
            )));
        }
        employees.insert(employee.id(), employee.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        Ok(lock(&self.employees)?.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Employee>, RepositoryError> {
        Ok(lock(&self.employees)?
            .values()
            .find(|e| e.username() == username)
            .cloned())
    }

    async fn find_page(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Employee>, RepositoryError> {
        let mut matched: Vec<Employee> = lock(&self.employees)?
            .values()
            .filter(|e| name.map_or(true, |n| e.name().contains(n)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.audit().create_time().cmp(&a.audit().create_time()));
        Ok(paginate(matched, page))
    }
}

/// インメモリ菜品リポジトリ
/// 削除と販売停止の判定にセットメニューのデータを参照する
#[derive(Default)]
pub struct InMemoryDishRepository {
    dishes: Mutex<HashMap<DishId, Dish>>,
    setmeals: InMemorySetmealRepository,
}

impl InMemoryDishRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// セットメニューのリポジトリとデータを共有して作成
    pub fn with_setmeals(setmeals: InMemorySetmealRepository) -> Self {
        Self {
            dishes: Mutex::new(HashMap::new()),
            setmeals,
        }
    }

    fn select(&self, query: &MenuQuery) -> Result<Vec<Dish>, RepositoryError> {
        let mut matched: Vec<Dish> = lock(&self.dishes)?
            .values()
            .filter(|d| matches_menu(query, d.name(), d.category_id(), d.status()))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.audit().create_time().cmp(&a.audit().create_time()));
        Ok(matched)
    }
}

#[async_trait]
impl DishRepository for InMemoryDishRepository {
    async fn save(&self, dish: &Dish) -> Result<(), RepositoryError> {
        let mut dishes = lock(&self.dishes)?;
        if dishes
            .values()
            .any(|d| d.name() == dish.name() && d.id() != dish.id())
        {
            return Err(RepositoryError::DuplicateEntry(format!(
                "菜品名が既に使われています: {}",
                dish.name()
            )));
        }
        dishes.insert(dish.id(), dish.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: DishId) -> Result<Option<Dish>, RepositoryError> {
        Ok(lock(&self.dishes)?.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[DishId]) -> Result<Vec<Dish>, RepositoryError> {
        let dishes = lock(&self.dishes)?;
        Ok(ids.iter().filter_map(|id| dishes.get(id).cloned()).collect())
    }

    async fn find_page(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<Dish>, RepositoryError> {
        Ok(paginate(self.select(query)?, page))
    }

    async fn find_all(&self, query: &MenuQuery) -> Result<Vec<Dish>, RepositoryError> {
        self.select(query)
    }

    async fn delete_by_ids(&self, ids: &[DishId]) -> Result<bool, RepositoryError> {
        let mut dishes = lock(&self.dishes)?;
        let setmeals = lock(&self.setmeals.setmeals)?;
        let deletable = ids.iter().all(|id| {
            dishes.get(id).is_some_and(|d| !d.is_on_sale())
                && !setmeals.values().any(|s| s.dish_ids().contains(id))
        });
        if !deletable {
            return Ok(false);
        }
        for id in ids {
            dishes.remove(id);
        }
        Ok(true)
    }

    async fn stop_sale(
        &self,
        dish: &Dish,
        actor: Option<EmployeeId>,
    ) -> Result<Vec<SetmealId>, RepositoryError> {
        let mut dishes = lock(&self.dishes)?;
        let mut setmeals = lock(&self.setmeals.setmeals)?;
        dishes.insert(dish.id(), dish.clone());

        let mut stopped = Vec::new();
        for setmeal in setmeals
            .values_mut()
            .filter(|s| s.is_on_sale() && s.dish_ids().contains(&dish.id()))
        {
            setmeal.change_status(Status::Disabled, actor);
            stopped.push(setmeal.id());
        }
        Ok(stopped)
    }
}

/// インメモリセットメニューリポジトリ
/// クローンは同じデータを共有する（菜品リポジトリが参照するため）
#[derive(Clone, Default)]
pub struct InMemorySetmealRepository {
    setmeals: Arc<Mutex<HashMap<SetmealId, Setmeal>>>,
}

impl InMemorySetmealRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, query: &MenuQuery) -> Result<Vec<Setmeal>, RepositoryError> {
        let mut matched: Vec<Setmeal> = lock(&self.setmeals)?
            .values()
            .filter(|s| matches_menu(query, s.name(), s.category_id(), s.status()))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.audit().create_time().cmp(&a.audit().create_time()));
        Ok(matched)
    }
}

#[async_trait]
impl SetmealRepository for InMemorySetmealRepository {
    async fn save(&self, setmeal: &Setmeal) -> Result<(), RepositoryError> {
        let mut setmeals = lock(&self.setmeals)?;
        if setmeals
            .values()
            .any(|s| s.name() == setmeal.name() && s.id() != setmeal.id())
        {
            return Err(RepositoryError::DuplicateEntry(format!(
                "セットメニュー名が既に使われています: {}",
                setmeal.name()
            )));
        }
        setmeals.insert(setmeal.id(), setmeal.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: SetmealId) -> Result<Option<Setmeal>, RepositoryError> {
        Ok(lock(&self.setmeals)?.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[SetmealId]) -> Result<Vec<Setmeal>, RepositoryError> {
        let setmeals = lock(&self.setmeals)?;
        Ok(ids.iter().filter_map(|id| setmeals.get(id).cloned()).collect())
    }

    async fn find_page(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<Setmeal>, RepositoryError> {
        Ok(paginate(self.select(query)?, page))
    }

    async fn find_all(&self, query: &MenuQuery) -> Result<Vec<Setmeal>, RepositoryError> {
        self.select(query)
    }

    async fn find_ids_by_dish_ids(
        &self,
        dish_ids: &[DishId],
    ) -> Result<Vec<SetmealId>, RepositoryError> {
        Ok(lock(&self.setmeals)?
            .values()
            .filter(|s| s.dish_ids().iter().any(|id| dish_ids.contains(id)))
            .map(Setmeal::id)
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[SetmealId]) -> Result<bool, RepositoryError> {
        let mut setmeals = lock(&self.setmeals)?;
        if !ids
            .iter()
            .all(|id| setmeals.get(id).is_some_and(|s| !s.is_on_sale()))
        {
            return Ok(false);
        }
        for id in ids {
            setmeals.remove(id);
        }
        Ok(true)
    }
}

/// インメモリ顧客リポジトリ
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        lock(&self.users)?.insert(user.openid().to_string(), user.clone());
        Ok(())
    }

    async fn find_by_openid(&self, openid: &str) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.users)?.get(openid).cloned())
    }
}

/// インメモリ配送先住所リポジトリ
#[derive(Default)]
pub struct InMemoryAddressBookRepository {
    addresses: Mutex<Vec<AddressBook>>,
}

impl InMemoryAddressBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressBookRepository for InMemoryAddressBookRepository {
    async fn save(&self, address: &AddressBook) -> Result<(), RepositoryError> {
        let mut addresses = lock(&self.addresses)?;
        match addresses.iter_mut().find(|a| a.id() == address.id()) {
            Some(existing) => *existing = address.clone(),
            None => addresses.push(address.clone()),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: AddressBookId) -> Result<Option<AddressBook>, RepositoryError> {
        Ok(lock(&self.addresses)?.iter().find(|a| a.id() == id).cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<AddressBook>, RepositoryError> {
        Ok(lock(&self.addresses)?
            .iter()
            .filter(|a| a.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn mark_default(
        &self,
        user_id: UserId,
        id: AddressBookId,
    ) -> Result<(), RepositoryError> {
        for address in lock(&self.addresses)?
            .iter_mut()
            .filter(|a| a.user_id() == user_id)
        {
            let is_target = address.id() == id;
            address.set_default(is_target);
        }
        Ok(())
    }

    async fn delete(&self, id: AddressBookId) -> Result<(), RepositoryError> {
        lock(&self.addresses)?.retain(|a| a.id() != id);
        Ok(())
    }
}

/// インメモリショッピングカートリポジトリ
/// クローンは同じデータを共有する（注文リポジトリがカートを空にするため）
#[derive(Clone, Default)]
pub struct InMemoryShoppingCartRepository {
    items: Arc<Mutex<HashMap<CartItemId, CartItem>>>,
}

impl InMemoryShoppingCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_user(&self, user_id: UserId) -> Result<(), RepositoryError> {
        lock(&self.items)?.retain(|_, item| item.user_id() != user_id);
        Ok(())
    }
}

#[async_trait]
impl ShoppingCartRepository for InMemoryShoppingCartRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<ShoppingCart, RepositoryError> {
        let mut items: Vec<CartItem> = lock(&self.items)?
            .values()
            .filter(|item| item.user_id() == user_id)
            .cloned()
            .collect();
        items.sort_by_key(CartItem::created_at);
        Ok(ShoppingCart::new(items))
    }

    async fn save(&self, item: &CartItem) -> Result<(), RepositoryError> {
        lock(&self.items)?.insert(item.id(), item.clone());
        Ok(())
    }

    async fn delete(&self, id: CartItemId) -> Result<(), RepositoryError> {
        lock(&self.items)?.remove(&id);
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        self.clear_user(user_id)
    }
}

/// インメモリ注文リポジトリ
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<OrderId, Order>>,
    shopping_carts: InMemoryShoppingCartRepository,
}

impl InMemoryOrderRepository {
    /// 注文確定時に空にするカートのリポジトリを受け取る
    pub fn new(shopping_carts: InMemoryShoppingCartRepository) -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
            shopping_carts,
        }
    }

    /// 未発行のドメインイベントは保存しない
    fn snapshot(order: &Order) -> Order {
        Order::reconstruct(order.record().clone(), order.details().to_vec())
    }

    fn select<F>(&self, predicate: F) -> Result<Vec<Order>, RepositoryError>
    where
        F: Fn(&Order) -> bool,
    {
        let mut matched: Vec<Order> = lock(&self.orders)?
            .values()
            .filter(|o| predicate(o))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.order_time().cmp(&a.order_time()));
        Ok(matched)
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn place(&self, order: &Order) -> Result<(), RepositoryError> {
        {
            let mut orders = lock(&self.orders)?;
            if orders.values().any(|o| o.number() == order.number()) {
                return Err(RepositoryError::DuplicateEntry(format!(
                    "注文番号が重複しています: {}",
                    order.number()
                )));
            }
            orders.insert(order.id(), Self::snapshot(order));
        }
        self.shopping_carts.clear_user(order.user_id())
    }

    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = lock(&self.orders)?;
        let stored = orders.get(&order.id()).ok_or_else(|| {
            RepositoryError::OperationFailed(format!("注文が存在しません: {}", order.id()))
        })?;
        if stored.status() != order.loaded_status() {
            return Err(RepositoryError::Conflict(format!(
                "注文のステータスが更新されています: {}",
                order.number()
            )));
        }
        orders.insert(order.id(), Self::snapshot(order));
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(lock(&self.orders)?.get(&id).cloned())
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Order>, RepositoryError> {
        Ok(lock(&self.orders)?
            .values()
            .find(|o| o.number() == number)
            .cloned())
    }

    async fn find_page(
        &self,
        query: &OrderQuery,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let matched = self.select(|o| {
            query.status.map_or(true, |s| o.status() == s)
                && query.user_id.map_or(true, |u| o.user_id() == u)
                && query
                    .number
                    .as_deref()
                    .map_or(true, |n| o.number().contains(n))
        })?;
        Ok(paginate(matched, page))
    }

    async fn find_by_status_before(
        &self,
        status: OrderStatus,
        order_time: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.select(|o| o.status() == status && o.order_time() < order_time)
    }

    async fn count_between(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepositoryError> {
        let matched = self.select(|o| {
            (begin..end).contains(&o.order_time()) && status.map_or(true, |s| o.status() == s)
        })?;
        Ok(matched.len() as u64)
    }

    async fn sum_amount_between(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        status: OrderStatus,
    ) -> Result<Money, RepositoryError> {
        self.select(|o| o.status() == status && (begin..end).contains(&o.order_time()))?
            .iter()
            .try_fold(Money::zero(), |acc, o| acc.add(&o.amount()))
            .map_err(|e| RepositoryError::OperationFailed(e.to_string()))
    }

    async fn top_sales(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<SalesRank>, RepositoryError> {
        let completed = self.select(|o| {
            o.status() == OrderStatus::Completed && (begin..end).contains(&o.order_time())
        })?;
        let mut totals: HashMap<String, u64> = HashMap::new();
        for detail in completed.iter().flat_map(|o| o.details()) {
            *totals.entry(detail.name().to_string()).or_default() += u64::from(detail.number());
        }

        let mut ranks: Vec<SalesRank> = totals
            .into_iter()
            .map(|(name, number)| SalesRank { name, number })
            .collect();
        ranks.sort_by(|a, b| b.number.cmp(&a.number).then_with(|| a.name.cmp(&b.name)));
        ranks.truncate(limit as usize);
        Ok(ranks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        AddressDraft, AuditInfo, CartProduct, CategoryId, DishDraft, EmployeeProfile, Money,
    };

    fn employee(username: &str, name: &str) -> Employee {
        Employee::new(
            EmployeeId::new(),
            EmployeeProfile {
                username: username.to_string(),
                name: name.to_string(),
                phone: String::new(),
                sex: String::new(),
                id_number: String::new(),
            },
            "hash".to_string(),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_employee_username_is_unique() {
        let repository = InMemoryEmployeeRepository::new();
        repository.save(&employee("zhang", "張")).await.unwrap();

        let result = repository.save(&employee("zhang", "別人")).await;
        assert!(matches!(result, Err(RepositoryError::DuplicateEntry(_))));
    }

    #[tokio::test]
    async fn test_employee_page_filters_by_name() {
        let repository = InMemoryEmployeeRepository::new();
        for (username, name) in [("a", "王一"), ("b", "王二"), ("c", "李三")] {
            repository.save(&employee(username, name)).await.unwrap();
        }

        let page = repository
            .find_page(Some("王"), PageRequest::new(Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn test_dish_find_by_ids_ignores_missing() {
        let repository = InMemoryDishRepository::new();
        let dish = Dish::reconstruct(
            DishId::new(),
            "麻婆豆腐".to_string(),
            CategoryId::new(),
            Money::cny(2200),
            String::new(),
            String::new(),
            Status::Enabled,
            vec![],
            AuditInfo::created_by(None),
        );
        repository.save(&dish).await.unwrap();

        let found = repository
            .find_by_ids(&[dish.id(), DishId::new()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let draft = DishDraft {
            name: "麻婆豆腐".to_string(),
            category_id: CategoryId::new(),
            price: Money::cny(100),
            image: String::new(),
            description: String::new(),
            flavors: vec![],
        };
        let duplicate = Dish::new(DishId::new(), draft, Status::Disabled, None).unwrap();
        assert!(repository.save(&duplicate).await.is_err());
    }

    #[tokio::test]
    async fn test_cart_clones_share_state() {
        let carts = InMemoryShoppingCartRepository::new();
        let other = carts.clone();
        let user = UserId::new();
        let item = CartItem::new(
            CartItemId::new(),
            user,
            CartProduct::Setmeal {
                setmeal_id: SetmealId::new(),
            },
            "定食".to_string(),
            String::new(),
            Money::cny(100),
        );
        carts.save(&item).await.unwrap();

        assert_eq!(other.find_by_user(user).await.unwrap().items().len(), 1);
        other.clear(user).await.unwrap();
        assert!(carts.find_by_user(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_default_only_touches_own_addresses() {
        let repository = InMemoryAddressBookRepository::new();
        let draft = AddressDraft {
            consignee: "王".to_string(),
            phone: "13000000000".to_string(),
            sex: "1".to_string(),
            province_name: String::new(),
            city_name: String::new(),
            district_name: String::new(),
            detail: "一号".to_string(),
            label: String::new(),
        };
        let alice = UserId::new();
        let bob = UserId::new();
        let mut bobs = AddressBook::new(AddressBookId::new(), bob, draft.clone()).unwrap();
        bobs.set_default(true);
        let alices = AddressBook::new(AddressBookId::new(), alice, draft).unwrap();
        repository.save(&bobs).await.unwrap();
        repository.save(&alices).await.unwrap();

        repository.mark_default(alice, alices.id()).await.unwrap();

        assert!(repository.find_by_id(alices.id()).await.unwrap().unwrap().is_default());
        assert!(repository.find_by_id(bobs.id()).await.unwrap().unwrap().is_default());
    }
}
