use serde::{Deserialize, Serialize};

use depot_core::{Amount, DomainError, DomainResult, GoodsId, GoodsTypeId};

/// Input for registering a goods record in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGoods {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub unit: String,
    pub type_id: GoodsTypeId,
    #[serde(default)]
    pub purchasing_price: Amount,
    #[serde(default)]
    pub selling_price: Amount,
    #[serde(default)]
    pub inventory_quantity: i64,
}

/// Catalog goods record carrying its current stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goods {
    pub id: GoodsId,
    pub code: String,
    pub name: String,
    pub model: String,
    pub unit: String,
    pub type_id: GoodsTypeId,
    pub purchasing_price: Amount,
    pub last_purchasing_price: Amount,
    pub selling_price: Amount,
    pub inventory_quantity: i64,
}

depot_core::impl_entity!(Goods, GoodsId);

impl Goods {
    pub fn create(id: GoodsId, input: NewGoods) -> DomainResult<Self> {
        let code = input.code.trim();
        let name = input.name.trim();
        if code.is_empty() {
            return Err(DomainError::validation("goods code must not be empty"));
        }
        if name.is_empty() {
            return Err(DomainError::validation("goods name must not be empty"));
        }
        if input.purchasing_price.is_negative() || input.selling_price.is_negative() {
            return Err(DomainError::validation("goods prices must not be negative"));
        }
        if input.inventory_quantity < 0 {
            return Err(DomainError::validation("inventory quantity must not be negative"));
        }

        Ok(Self {
            id,
            code: code.to_string(),
            name: name.to_string(),
            model: input.model.trim().to_string(),
            unit: input.unit.trim().to_string(),
            type_id: input.type_id,
            purchasing_price: input.purchasing_price,
            last_purchasing_price: input.purchasing_price,
            selling_price: input.selling_price,
            inventory_quantity: input.inventory_quantity,
        })
    }

    /// Book a purchase receipt of `quantity` units at `price` each.
    ///
    /// Stock grows by `quantity`, the last purchasing price becomes `price`
    /// and the purchasing price becomes the quantity-weighted average of the
    /// stock on hand and the receipt (rounded toward zero).
    pub fn receive(&mut self, quantity: i64, price: Amount) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation("received quantity must be positive"));
        }
        if price.is_negative() {
            return Err(DomainError::validation("received price must not be negative"));
        }

        let on_hand = self.inventory_quantity.max(0);
        let new_quantity = self
            .inventory_quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("inventory quantity overflow"))?;

        let weighted = i128::from(on_hand) * i128::from(self.purchasing_price.minor())
            + i128::from(quantity) * i128::from(price.minor());
        let average = weighted / (i128::from(on_hand) + i128::from(quantity));
        let average = i64::try_from(average)
            .map_err(|_| DomainError::validation("purchasing price overflow"))?;

        self.inventory_quantity = new_quantity;
        self.last_purchasing_price = price;
        self.purchasing_price = Amount::from_minor(average);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn goods(quantity: i64, price: i64) -> Goods {
        Goods::create(
            GoodsId::new(),
            NewGoods {
                code: "A1".into(),
                name: "Apple juice".into(),
                model: "1L".into(),
                unit: "box".into(),
                type_id: GoodsTypeId::new(),
                purchasing_price: Amount::from_minor(price),
                selling_price: Amount::from_minor(price * 2),
                inventory_quantity: quantity,
            },
        )
        .unwrap()
    }

    #[test]
    fn receive_on_empty_stock_takes_the_receipt_price() {
        let mut g = goods(0, 0);
        g.receive(3, Amount::from_minor(10)).unwrap();
        assert_eq!(g.inventory_quantity, 3);
        assert_eq!(g.purchasing_price, Amount::from_minor(10));
        assert_eq!(g.last_purchasing_price, Amount::from_minor(10));
    }

    #[test]
    fn receive_averages_by_quantity() {
        let mut g = goods(10, 100);
        g.receive(10, Amount::from_minor(200)).unwrap();
        assert_eq!(g.inventory_quantity, 20);
        assert_eq!(g.purchasing_price, Amount::from_minor(150));
        assert_eq!(g.last_purchasing_price, Amount::from_minor(200));
    }

    #[test]
    fn receive_rejects_non_positive_quantity() {
        let mut g = goods(1, 1);
        assert!(g.receive(0, Amount::from_minor(1)).is_err());
        assert_eq!(g.inventory_quantity, 1);
    }

    #[test]
    fn create_rejects_blank_code() {
        let mut input = NewGoods {
            code: " ".into(),
            name: "x".into(),
            model: String::new(),
            unit: String::new(),
            type_id: GoodsTypeId::new(),
            purchasing_price: Amount::ZERO,
            selling_price: Amount::ZERO,
            inventory_quantity: 0,
        };
        assert!(Goods::create(GoodsId::new(), input.clone()).is_err());
        input.code = "C".into();
        assert!(Goods::create(GoodsId::new(), input).is_ok());
    }

    proptest! {
        #[test]
        fn receive_adds_exactly_the_line_quantity(start in 0i64..10_000, qty in 1i64..10_000, price in 0i64..100_000) {
            let mut g = goods(start, 500);
            g.receive(qty, Amount::from_minor(price)).unwrap();
            prop_assert_eq!(g.inventory_quantity, start + qty);
        }

        #[test]
        fn average_lies_between_old_and_new_price(start in 0i64..10_000, qty in 1i64..10_000, price in 0i64..100_000) {
            let mut g = goods(start, 500);
            g.receive(qty, Amount::from_minor(price)).unwrap();
            let lo = price.min(500);
            let hi = price.max(500);
            let avg = g.purchasing_price.minor();
            prop_assert!(lo <= avg && avg <= hi);
        }
    }
}
