//! In-process store backed by a single `RwLock`.
//!
//! Used by the test suites and by `EMPORIUM_STORE=memory`. Every mutation
//! runs under the write lock, which makes each operation (checkout in
//! particular) atomic with respect to all others.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use emporium_core::{CartId, Email, OrderId, ProductId, Quantity, ShippingAddress, UserId};

use super::{CartStore, CatalogStore, OrderStore, RepositoryError, Store, UserStore};
use crate::models::{
    Cart, CartError, CartItem, CheckoutError, CheckoutLine, NewProduct, NewUser, Order,
    OrderDraft, Product, User,
};

/// Store that keeps everything in memory. Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_user_id: i32,
    last_product_id: i32,
    last_cart_id: i32,
    last_order_id: i32,
    users: BTreeMap<UserId, UserRecord>,
    products: BTreeMap<ProductId, Product>,
    carts: HashMap<UserId, CartRecord>,
    orders: Vec<Order>,
}

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct CartRecord {
    id: CartId,
    lines: Vec<(ProductId, Quantity)>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn cart_for(&mut self, user: UserId) -> &mut CartRecord {
        let Self {
            carts,
            last_cart_id,
            ..
        } = self;
        carts.entry(user).or_insert_with(|| {
            let now = Utc::now();
            CartRecord {
                id: CartId::new(next_id(last_cart_id)),
                lines: Vec::new(),
                created_at: now,
                updated_at: now,
            }
        })
    }

    /// The cart joined with current products. Lines whose product has gone
    /// are skipped.
    fn cart_view(&self, user: UserId) -> Option<Cart> {
        let record = self.carts.get(&user)?;
        let items = record
            .lines
            .iter()
            .filter_map(|(product_id, quantity)| {
                self.products.get(product_id).map(|product| CartItem {
                    product: product.clone(),
                    quantity: *quantity,
                })
            })
            .collect();
        Some(Cart::new(
            record.id,
            user,
            items,
            record.created_at,
            record.updated_at,
        ))
    }

    fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|r| r.user.email == *email && Some(r.user.id) != except)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.products.values().cloned().collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(&id).cloned())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let created = Product {
            id: ProductId::new(next_id(&mut inner.last_product_id)),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            category: product.category.clone(),
            image: product.image.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.products.remove(&id).is_none() {
            return Ok(false);
        }
        for cart in inner.carts.values_mut() {
            cart.lines.retain(|(product_id, _)| *product_id != id);
        }
        Ok(true)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn get_or_create_cart(&self, user: UserId) -> Result<Cart, RepositoryError> {
        let mut inner = self.inner.write().await;
        inner.cart_for(user);
        inner.cart_view(user).ok_or(RepositoryError::NotFound)
    }

    async fn add_item(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError> {
        let mut inner = self.inner.write().await;
        if !inner.products.contains_key(&product) {
            return Err(CartError::ProductNotFound(product));
        }

        let cart = inner.cart_for(user);
        match cart.lines.iter_mut().find(|(id, _)| *id == product) {
            Some((_, existing)) => *existing = existing.checked_add(quantity)?,
            None => cart.lines.push((product, quantity)),
        }
        cart.updated_at = Utc::now();

        inner
            .cart_view(user)
            .ok_or(CartError::Repository(RepositoryError::NotFound))
    }

    async fn set_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError> {
        let mut inner = self.inner.write().await;
        let cart = inner.carts.get_mut(&user).ok_or(CartError::CartNotFound)?;
        let (_, existing) = cart
            .lines
            .iter_mut()
            .find(|(id, _)| *id == product)
            .ok_or(CartError::ItemNotFound(product))?;
        *existing = quantity;
        cart.updated_at = Utc::now();

        inner.cart_view(user).ok_or(CartError::CartNotFound)
    }

    async fn remove_item(&self, user: UserId, product: ProductId) -> Result<Cart, CartError> {
        let mut inner = self.inner.write().await;
        let cart = inner.carts.get_mut(&user).ok_or(CartError::CartNotFound)?;
        cart.lines.retain(|(id, _)| *id != product);
        cart.updated_at = Utc::now();

        inner.cart_view(user).ok_or(CartError::CartNotFound)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn checkout(
        &self,
        user: UserId,
        shipping_address: &ShippingAddress,
    ) -> Result<Order, CheckoutError> {
        let mut inner = self.inner.write().await;

        let lines: Vec<CheckoutLine> = inner
            .carts
            .get(&user)
            .map(|cart| {
                cart.lines
                    .iter()
                    .map(|(product_id, quantity)| {
                        let current = inner.products.get(product_id);
                        CheckoutLine {
                            product_id: *product_id,
                            quantity: *quantity,
                            name: current.map(|p| p.name.clone()),
                            price: current.map(|p| p.price),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let draft = OrderDraft::price(user, lines, shipping_address.clone())?;

        let id = OrderId::new(next_id(&mut inner.last_order_id));
        let order = draft.into_order(id, Utc::now());
        inner.orders.push(order.clone());

        if let Some(cart) = inner.carts.get_mut(&user) {
            cart.lines.clear();
            cart.updated_at = Utc::now();
        }

        Ok(order)
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .iter()
            .filter(|o| o.user_id == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn get_order(&self, user: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .find(|o| o.id == id && o.user_id == user)
            .cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&user.email, None) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let now = Utc::now();
        let created = User {
            id: UserId::new(next_id(&mut inner.last_user_id)),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(
            created.id,
            UserRecord {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).map(|r| r.user.clone()))
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|r| r.user.email == *email)
            .map(|r| (r.user.clone(), r.password_hash.clone())))
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).map(|r| r.password_hash.clone()))
    }

    async fn update_profile(
        &self,
        id: UserId,
        username: Option<&str>,
        email: Option<&Email>,
    ) -> Result<User, RepositoryError> {
        let mut inner = self.inner.write().await;
        if let Some(email) = email
            && inner.email_taken(email, Some(id))
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let record = inner.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if let Some(username) = username {
            username.clone_into(&mut record.user.username);
        }
        if let Some(email) = email {
            record.user.email = email.clone();
        }
        record.user.updated_at = Utc::now();
        Ok(record.user.clone())
    }

    async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let record = inner.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        hash.clone_into(&mut record.password_hash);
        record.user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
