use chrono::Utc;
use proptest::prelude::*;
use sky_take_out::adapter::driver::request_dto::IdsQuery;
use sky_take_out::domain::error::DomainError;
use sky_take_out::domain::model::{
    AddressBook, AddressBookId, AddressDraft, CartItem, CartItemId, CartProduct, DishId, Money,
    Order, OrderId, OrderRequest, OrderStatus, PageRequest, PayMethod, SetmealId, ShoppingCart,
    Status, UserId,
};
use uuid::Uuid;

fn address_for(user_id: UserId) -> AddressBook {
    AddressBook::new(
        AddressBookId::new(),
        user_id,
        AddressDraft {
            consignee: "陳一".to_string(),
            phone: "13100000000".to_string(),
            sex: "1".to_string(),
            province_name: "広東省".to_string(),
            city_name: "深圳市".to_string(),
            district_name: "南山区".to_string(),
            detail: "科技園".to_string(),
            label: String::new(),
        },
    )
    .unwrap()
}

/// i128で計算した期待値。i64に収まらなければ桁あふれ
fn checked_total(lines: &[(i64, u32, bool)], extra: i64) -> Result<Money, DomainError> {
    let total: i128 = lines
        .iter()
        .map(|(price, number, _)| i128::from(*price) * i128::from(*number))
        .sum::<i128>()
        + i128::from(extra);
    i64::try_from(total)
        .map(Money::cny)
        .map_err(|_| DomainError::AmountOverflow)
}

/// 通常の価格と、数個で上限を超える価格の両方を生成する
fn price_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![0i64..100_000, (i64::MAX / 8)..=i64::MAX]
}

fn cart_of(user_id: UserId, lines: &[(i64, u32, bool)]) -> ShoppingCart {
    let items = lines
        .iter()
        .enumerate()
        .map(|(i, (price, number, is_dish))| {
            let product = if *is_dish {
                CartProduct::Dish {
                    dish_id: DishId::new(),
                    flavor: None,
                }
            } else {
                CartProduct::Setmeal {
                    setmeal_id: SetmealId::new(),
                }
            };
            CartItem::reconstruct(
                CartItemId::new(),
                user_id,
                product,
                format!("商品{}", i),
                String::new(),
                Money::cny(*price),
                *number,
                Utc::now(),
            )
            .unwrap()
        })
        .collect();
    ShoppingCart::new(items)
}

// Money のプロパティベーステスト
proptest! {
    /// Money の加算は交換法則を満たし、上限を超えるとエラーになる
    #[test]
    fn test_money_addition_is_commutative(
        amount1 in 0i64..=i64::MAX,
        amount2 in 0i64..=i64::MAX,
    ) {
        let money1 = Money::cny(amount1);
        let money2 = Money::cny(amount2);

        prop_assert_eq!(money1.add(&money2), money2.add(&money1));
        match amount1.checked_add(amount2) {
            Some(sum) => prop_assert_eq!(money1.add(&money2), Ok(Money::cny(sum))),
            None => prop_assert_eq!(money1.add(&money2), Err(DomainError::AmountOverflow)),
        }
    }

    /// Money の乗算は分配法則を満たす (a * (b + c) = a * b + a * c)
    /// 上限を超える場合はどちらの計算もエラーになる
    #[test]
    fn test_money_multiplication_distributive(
        base_amount in 1i64..=i64::MAX,
        factor1 in 1u32..1_000,
        factor2 in 1u32..1_000,
    ) {
        let money = Money::cny(base_amount);

        let left_side = money.multiply(factor1 + factor2);
        let right_side = money
            .multiply(factor1)
            .and_then(|a| money.multiply(factor2).and_then(|b| a.add(&b)));

        let expected = i128::from(base_amount) * i128::from(factor1 + factor2);
        if expected <= i128::from(i64::MAX) {
            prop_assert_eq!(&left_side, &right_side);
            prop_assert!(left_side.is_ok());
        } else {
            prop_assert_eq!(left_side, Err(DomainError::AmountOverflow));
            prop_assert_eq!(right_side, Err(DomainError::AmountOverflow));
        }
    }

    /// 負の金額は作成できない
    #[test]
    fn test_negative_money_is_rejected(amount in i64::MIN..0) {
        prop_assert!(Money::new(amount).is_err());
    }

    /// 表示は「元.分」の2桁
    #[test]
    fn test_money_display_has_two_decimals(amount in 0i64..10_000_000) {
        let text = Money::cny(amount).to_string();
        let (yuan, fen) = text.split_once('.').unwrap();
        prop_assert_eq!(fen.len(), 2);
        prop_assert_eq!(yuan.parse::<i64>().unwrap() * 100 + fen.parse::<i64>().unwrap(), amount);
    }
}

// カートと注文金額のプロパティベーステスト
proptest! {
    /// カートの合計は各明細の単価 × 数量の合計と等しく、上限を超えればエラー
    #[test]
    fn test_cart_total_is_sum_of_subtotals(
        lines in prop::collection::vec((price_strategy(), 1u32..20, any::<bool>()), 0..10),
    ) {
        let cart = cart_of(UserId::new(), &lines);

        prop_assert_eq!(cart.total(), checked_total(&lines, 0));
    }

    /// 注文金額はカートの合計 + 梱包料金で、明細はカートの行と一対一
    #[test]
    fn test_order_amount_is_cart_total_plus_pack_amount(
        lines in prop::collection::vec((price_strategy(), 1u32..20, any::<bool>()), 1..10),
        pack_amount in prop_oneof![0i64..1_000, Just(i64::MAX)],
    ) {
        let user_id = UserId::new();
        let address = address_for(user_id);
        let cart = cart_of(user_id, &lines);

        let placed = Order::place(
            OrderId::new(),
            Order::generate_number(),
            user_id,
            &address,
            &cart,
            OrderRequest {
                address_book_id: address.id(),
                pay_method: PayMethod::WeChat,
                remark: String::new(),
                estimated_delivery_time: None,
                pack_amount: Money::cny(pack_amount),
                tableware_number: 0,
            },
        );

        let expected = checked_total(&lines, pack_amount);
        let order = match (placed, expected) {
            (Ok(order), Ok(amount)) => {
                prop_assert_eq!(order.amount(), amount);
                order
            }
            (Err(err), Err(_)) => {
                prop_assert_eq!(err, DomainError::AmountOverflow);
                return Ok(());
            }
            (placed, expected) => {
                return Err(TestCaseError::fail(format!(
                    "{:?} != {:?}",
                    placed.map(|o| o.amount()),
                    expected
                )));
            }
        };
        prop_assert_eq!(order.details().len(), lines.len());
        prop_assert_eq!(order.status(), OrderStatus::PendingPayment);
        for (detail, (price, number, is_dish)) in order.details().iter().zip(lines.iter()) {
            prop_assert_eq!(detail.amount(), Money::cny(*price));
            prop_assert_eq!(detail.number(), *number);
            prop_assert_eq!(detail.dish_id().is_some(), *is_dish);
            prop_assert_eq!(detail.setmeal_id().is_some(), !*is_dish);
        }
    }

    /// 他人の住所では注文できない
    #[test]
    fn test_order_requires_own_address(price in 1i64..10_000) {
        let user_id = UserId::new();
        let address = address_for(UserId::new());
        let cart = cart_of(user_id, &[(price, 1, true)]);

        let result = Order::place(
            OrderId::new(),
            Order::generate_number(),
            user_id,
            &address,
            &cart,
            OrderRequest {
                address_book_id: address.id(),
                pay_method: PayMethod::Alipay,
                remark: String::new(),
                estimated_delivery_time: None,
                pack_amount: Money::zero(),
                tableware_number: 0,
            },
        );
        prop_assert!(result.is_err());
    }
}

// ページングと状態コードのプロパティベーステスト
proptest! {
    /// ページング条件は常に1以上・上限以内に補正される
    #[test]
    fn test_page_request_is_clamped(
        page in prop::option::of(0u32..10_000),
        page_size in prop::option::of(0u32..10_000),
    ) {
        let request = PageRequest::new(page, page_size);

        prop_assert!(request.page() >= 1);
        prop_assert!(request.page_size() >= 1);
        prop_assert!(request.page_size() <= PageRequest::MAX_PAGE_SIZE);
        prop_assert_eq!(
            request.offset(),
            u64::from(request.page() - 1) * u64::from(request.page_size())
        );
    }

    /// 範囲外の状態コードは受け付けない
    #[test]
    fn test_unknown_status_codes_are_rejected(code in any::<i32>()) {
        prop_assert_eq!(Status::from_code(code).is_ok(), code == 0 || code == 1);
        prop_assert_eq!(OrderStatus::from_code(code).is_ok(), (1..=6).contains(&code));
    }

    /// 一括削除のID指定は空白や末尾のカンマを無視する
    #[test]
    fn test_ids_query_accepts_any_uuid_list(count in 0usize..8, trailing_comma in any::<bool>()) {
        let ids: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
        let mut raw = ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(" , ");
        if trailing_comma {
            raw.push(',');
        }

        let parsed = IdsQuery { ids: raw }.parse().unwrap();
        prop_assert_eq!(parsed, ids);
    }
}

#[test]
fn test_order_number_is_numeric() {
    let number = Order::generate_number();

    assert_eq!(number.len(), 21);
    assert!(number.chars().all(|c| c.is_ascii_digit()));
}
